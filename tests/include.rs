use std::fs;
use std::path::{Path, PathBuf};

use indentconf::{
    parse_file, parse_str, Builder, ErrorKind, FileFinder, FileKind, FoundFile, Lexeme, PathResolver, Result,
    Schema, SchemaNode,
};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

type Events = Vec<String>;

fn enter(_: &SchemaNode<Events>, lexeme: &Lexeme<'_>, events: &mut Events) -> Result<()> {
    events.push(format!("enter({})", lexeme.as_str()));
    Ok(())
}

fn exit(_: &SchemaNode<Events>, lexeme: &Lexeme<'_>, events: &mut Events) -> Result<()> {
    events.push(format!("exit({})", lexeme.as_str()));
    Ok(())
}

fn value(node: &SchemaNode<Events>, lexeme: &Lexeme<'_>, events: &mut Events) -> Result<()> {
    let file = Path::new(lexeme.file).file_name().map(|f| f.to_string_lossy().to_string());
    events.push(format!("value({}, {}) in {}", node.pattern(), lexeme.as_str(), file.unwrap_or_default()));
    Ok(())
}

fn schema() -> Schema<Events> {
    Schema::new(vec![
        SchemaNode::option("file", vec![]).on_value(value),
        SchemaNode::section(
            "zone",
            vec![
                SchemaNode::option("file", vec![]).on_value(value),
                SchemaNode::section("acl", vec![SchemaNode::option("allow", vec![]).on_value(value)])
                    .on_enter(enter)
                    .on_exit(exit),
            ],
        )
        .on_enter(enter)
        .on_exit(exit),
    ])
    .unwrap()
}

fn write(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, text).unwrap();
    path
}

#[test]
fn include_in_section() {
    init();
    let dir = tempfile::tempdir().unwrap();
    let main = write(dir.path(), "main.conf", "zone:\n  file: a\n  include: more.conf\n  file: c\n");
    write(dir.path(), "more.conf", "file: b\nacl:\n  allow: x\n");

    let mut events = Vec::new();
    parse_file(&schema(), &main, &mut events).unwrap();
    assert_eq!(
        events,
        vec![
            "enter(zone)",
            "value(file, a) in main.conf",
            "value(file, b) in more.conf",
            "enter(acl)",
            "value(allow, x) in more.conf",
            "exit(acl)",
            "value(file, c) in main.conf",
            "exit(zone)",
        ]
    );
}

#[test]
fn wildcards() {
    init();
    let dir = tempfile::tempdir().unwrap();
    let main = write(dir.path(), "main.conf", "include: conf.d/*.conf # all of them\nfile: z\n");
    write(dir.path(), "conf.d/b.conf", "file: b\n");
    write(dir.path(), "conf.d/a.conf", "file: a\n");
    write(dir.path(), "conf.d/ignored.txt", "file: x\n");
    fs::create_dir(dir.path().join("conf.d/sub.conf")).unwrap();

    let mut events = Vec::new();
    parse_file(&schema(), &main, &mut events).unwrap();
    assert_eq!(
        events,
        vec!["value(file, a) in a.conf", "value(file, b) in b.conf", "value(file, z) in main.conf"]
    );

    // no matches is fine, a missing directory is not.
    let main = write(dir.path(), "main.conf", "include: conf.d/*.none\n");
    parse_file(&schema(), &main, &mut Vec::new()).unwrap();
    let main = write(dir.path(), "main.conf", "include: nodir/*.conf\n");
    let e = parse_file(&schema(), &main, &mut Vec::new()).unwrap_err();
    assert_eq!(e.kind, ErrorKind::NoSuchFile);
    assert_eq!((e.pos.line, e.pos.column), (1, 10));
}

#[test]
fn brackets_are_literal() {
    init();
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "zone[1].conf", "file: one\n");
    write(dir.path(), "zone1.conf", "file: wrong\n");
    let main = write(dir.path(), "main.conf", "include: zone[1].conf\n");
    let mut events = Vec::new();
    parse_file(&schema(), &main, &mut events).unwrap();
    assert_eq!(events, vec!["value(file, one) in zone[1].conf"]);

    // a bracket in a literal name that does not exist is a missing file.
    let main = write(dir.path(), "main.conf", "include: zone[2].conf\n");
    let e = parse_file(&schema(), &main, &mut Vec::new()).unwrap_err();
    assert_eq!(e.kind, ErrorKind::NoSuchFile);
}

#[test]
fn wildcards_in_odd_directories() {
    init();
    let dir = tempfile::tempdir().unwrap();
    let main = write(dir.path(), "conf[x]/main.conf", "include: a*.conf\n");
    write(dir.path(), "conf[x]/a.conf", "file: a\n");
    write(dir.path(), "conf[x]/ab.conf", "file: ab\n");
    write(dir.path(), "conf?/a.conf", "file: wrong\n");

    let mut events = Vec::new();
    parse_file(&schema(), &main, &mut events).unwrap();
    assert_eq!(events, vec!["value(file, a) in a.conf", "value(file, ab) in ab.conf"]);
}

#[test]
fn missing_include() {
    init();
    let dir = tempfile::tempdir().unwrap();
    let main = write(dir.path(), "main.conf", "file: a\ninclude: missing.conf\n");
    let mut events = Vec::new();
    let e = parse_file(&schema(), &main, &mut events).unwrap_err();
    assert_eq!(e.kind, ErrorKind::NoSuchFile);
    assert_eq!(e.pos.line, 2);
    assert!(e.file_name.ends_with("main.conf"), "{}", e);
    assert_eq!(events, vec!["value(file, a) in main.conf"]);
}

#[test]
fn circular_include() {
    init();
    let dir = tempfile::tempdir().unwrap();
    let a = write(dir.path(), "a.conf", "file: a\ninclude: sub/b.conf\n");
    write(dir.path(), "sub/b.conf", "include: ../a.conf\n");
    let e = parse_file(&schema(), &a, &mut Vec::new()).unwrap_err();
    assert_eq!(e.kind, ErrorKind::Semantic);
    assert!(e.msg.starts_with("circular include"), "{}", e);
    assert!(e.file_name.ends_with("b.conf"), "{}", e);

    let a = write(dir.path(), "a.conf", "include: a.conf\n");
    let e = parse_file(&schema(), &a, &mut Vec::new()).unwrap_err();
    assert!(e.msg.starts_with("circular include"), "{}", e);

    // the same file twice in a row is not a loop.
    let a = write(dir.path(), "a.conf", "include: c.conf\ninclude: c.conf\n");
    write(dir.path(), "c.conf", "file: c\n");
    let mut events = Vec::new();
    parse_file(&schema(), &a, &mut events).unwrap();
    assert_eq!(events.len(), 2);
}

#[test]
fn errors_in_included_file() {
    init();
    let dir = tempfile::tempdir().unwrap();
    let main = write(dir.path(), "main.conf", "zone:\n  include: bad.conf\n");
    write(dir.path(), "bad.conf", "acl:\n    allow: x\n  allow: y\n");
    let e = parse_file(&schema(), &main, &mut Vec::new()).unwrap_err();
    assert_eq!(e.kind, ErrorKind::Syntax);
    assert!(e.file_name.ends_with("bad.conf"), "{}", e);
    assert_eq!(e.pos.line, 3);
}

#[test]
fn directive_syntax() {
    init();
    let dir = tempfile::tempdir().unwrap();
    let conf = write(dir.path(), "with space.conf", "file: q\n");

    // in-memory input with an absolute, quoted name.
    let text = format!("include: \"{}\"\n", conf.display());
    let mut events = Vec::new();
    parse_str(&schema(), &text, &mut events).unwrap();
    assert_eq!(events, vec!["value(file, q) in with space.conf"]);

    let e = parse_str(&schema(), "include:\nfile: a\n", &mut Vec::new()).unwrap_err();
    assert_eq!(e.kind, ErrorKind::Semantic);
    assert_eq!(e.msg, "include: directive takes a file name");

    let text = format!("include: \"{}\" extra\n", conf.display());
    let e = parse_str(&schema(), &text, &mut Vec::new()).unwrap_err();
    assert_eq!(e.kind, ErrorKind::Semantic);
    assert_eq!(e.msg, "include: directive takes only a file name");
}

// Serves a fixed list of files for any wildcard.
struct Fixed(Vec<PathBuf>);

impl FileFinder for Fixed {
    fn find<'f>(&'f self, _: &Path) -> Result<Box<dyn Iterator<Item = Result<FoundFile>> + 'f>> {
        Ok(Box::new(self.0.iter().map(|path| {
            Ok(FoundFile {
                path: path.clone(),
                kind: FileKind::Regular,
            })
        })))
    }
}

#[test]
fn custom_finder() {
    init();
    let dir = tempfile::tempdir().unwrap();
    let one = write(dir.path(), "one.conf", "file: 1\n");
    let two = write(dir.path(), "two.conf", "file: 2\n");
    let builder = Builder::new().finder(Fixed(vec![two, one]));

    let mut events = Vec::new();
    builder.parse_str(&schema(), "include: virtual/*\n", &mut events).unwrap();
    assert_eq!(events, vec!["value(file, 2) in two.conf", "value(file, 1) in one.conf"]);
}

// Sends every name in `aliases` to the same file.
struct Aliases {
    aliases: Vec<&'static str>,
    target: PathBuf,
}

impl PathResolver for Aliases {
    fn resolve(&self, path: &Path) -> Result<PathBuf> {
        let name = path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
        if self.aliases.contains(&name.as_str()) {
            return Ok(self.target.clone());
        }
        indentconf::Canonicalize.resolve(path)
    }
}

#[test]
fn custom_resolver() {
    init();
    let dir = tempfile::tempdir().unwrap();
    let main = write(dir.path(), "main.conf", "file: m\ninclude: first.conf\n");
    let target = write(dir.path(), "shared.conf", "file: s\ninclude: second.conf\n");
    let builder = Builder::new().resolver(Aliases {
        aliases: vec!["first.conf", "second.conf"],
        target,
    });

    // two names, one canonical path.
    let mut events = Vec::new();
    let e = builder.parse_file(&schema(), &main, &mut events).unwrap_err();
    assert_eq!(e.kind, ErrorKind::Semantic);
    assert!(e.msg.starts_with("circular include in"), "{}", e);
    assert!(e.msg.ends_with("second.conf"), "{}", e);
    assert_eq!(events, vec!["value(file, m) in main.conf", "value(file, s) in first.conf"]);
}
