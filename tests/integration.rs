use predicates::prelude::*;
use std::process::Command;
use tempfile::TempDir;

fn cmd() -> assert_cmd::Command {
    assert_cmd::Command::from(Command::new(env!("CARGO_BIN_EXE_girdoc")))
}

fn fixture_path(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn read(dir: &TempDir, name: &str) -> String {
    std::fs::read_to_string(dir.path().join(name))
        .unwrap_or_else(|e| panic!("reading {}: {}", name, e))
}

/// Run girdoc on the demo repository with the GObject include available.
fn run(dir: &TempDir, extra: &[&str]) -> assert_cmd::assert::Assert {
    cmd()
        .arg(fixture_path("Demo-1.0.gir"))
        .args(["-o", dir.path().to_str().unwrap()])
        .args(["-I", &fixture_path("gir")])
        .args(extra)
        .assert()
}

fn position(haystack: &str, needle: &str) -> usize {
    haystack
        .find(needle)
        .unwrap_or_else(|| panic!("{:?} not found in:\n{}", needle, haystack))
}

// -- configuration errors --

#[test]
fn missing_output_is_fatal() {
    cmd()
        .arg(fixture_path("Demo-1.0.gir"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("--output is required"));
}

#[test]
fn unknown_format_is_fatal() {
    let dir = TempDir::new().unwrap();
    run(&dir, &["-f", "docbook"])
        .failure()
        .stderr(predicate::str::contains("unknown format: docbook"));
}

#[test]
fn unknown_language_is_fatal() {
    let dir = TempDir::new().unwrap();
    run(&dir, &["-l", "lua"])
        .failure()
        .stderr(predicate::str::contains("unknown language: lua"));
}

#[test]
fn missing_gir_file_is_fatal() {
    let dir = TempDir::new().unwrap();
    cmd()
        .arg(fixture_path("Nope-1.0.gir"))
        .args(["-o", dir.path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read"));
}

// -- pages --

#[test]
fn writes_one_page_per_declaration() {
    let dir = TempDir::new().unwrap();
    run(&dir, &[]).success();

    for page in [
        "Demo.md",
        "Demo.Foo.md",
        "Demo.Foo.new.md",
        "Demo.Foo.bar.md",
        "Demo.Foo.update.md",
        "Demo.Foo-label.md",
        "Demo.Foo-changed.md",
        "Demo.init.md",
        "Demo.Align.md",
        "Demo.VERSION.md",
        "Demo.Visitor.md",
        "Demo.visit.md",
        "overview.md",
        "index.md",
    ] {
        assert!(dir.path().join(page).is_file(), "missing {}", page);
    }
    // records and unintrospectable callables have no page
    assert!(!dir.path().join("Demo.FooClass.md").exists());
    assert!(!dir.path().join("Demo.Foo.hidden.md").exists());
}

#[test]
fn references_resolve_or_stay_literal() {
    let dir = TempDir::new().unwrap();
    run(&dir, &[]).success();

    let init = read(&dir, "Demo.init.md");
    assert!(init.starts_with("### Demo.init (argc)\n\n+ argc (gint): Argument count.\n\n"));
    assert!(init.contains(
        "Call before [Demo.Foo.new](#Demo.Foo.new). \
         Use [Demo.Align.START](#Demo.Align) with *argc*. \
         Unknown #MyType stays."
    ));

    let foo = read(&dir, "Demo.Foo.md");
    // declarations of included namespaces get no page here
    assert!(foo.starts_with("## Demo.Foo\n\nExtends: GObject.Object\n\n"));
    assert!(foo.contains(
        "A [Demo.Foo](#Demo.Foo) holds [Demo.Foo-label](#Demo.Foo-label) \
         and emits [Demo.Foo-changed](#Demo.Foo-changed)."
    ));
}

#[test]
fn signal_and_property_pages() {
    let dir = TempDir::new().unwrap();
    run(&dir, &[]).success();

    let changed = read(&dir, "Demo.Foo-changed.md");
    assert!(changed.starts_with("### Demo.Foo-changed\n\n_Flags: Run Last_\n\n"));
    assert!(changed.contains("+ object ([Demo.Foo](#Demo.Foo)): The object that emitted the signal\n"));
    assert!(changed.contains("+ user_data (gpointer): "));

    let label = read(&dir, "Demo.Foo-label.md");
    assert!(label.starts_with("### Demo.Foo-label\n\n_Flags: Read, Write_\n\nThe label."));
}

#[test]
fn enum_pages_list_members() {
    let dir = TempDir::new().unwrap();
    run(&dir, &[]).success();
    assert!(read(&dir, "Demo.Align.md").starts_with(
        "## Demo.Align\n\n+ Demo.Align.START: Leading edge.\n+ Demo.Align.END: \n"
    ));
}

#[test]
fn markdown_links_point_at_written_pages() {
    let dir = TempDir::new().unwrap();
    run(&dir, &["-f", "markdown", "-M", &fixture_path("snippets")]).success();
    assert!(read(&dir, "Demo.init.md").contains("[Demo.Align.START](Demo.Align.md)"));

    let mut links = 0;
    for entry in std::fs::read_dir(dir.path()).unwrap() {
        let path = entry.unwrap().path();
        if path.extension().and_then(|e| e.to_str()) != Some("md") {
            continue;
        }
        let page = std::fs::read_to_string(&path).unwrap();
        for (start, _) in page.match_indices("](") {
            let rest = &page[start + 2..];
            let target = &rest[..rest.find(')').unwrap()];
            assert!(
                dir.path().join(target).is_file(),
                "{} links to missing {}",
                path.display(),
                target
            );
            links += 1;
        }
    }
    assert!(links > 0);
}

#[test]
fn return_values_and_parameter_annotations() {
    let dir = TempDir::new().unwrap();
    run(&dir, &[]).success();

    let visit = read(&dir, "Demo.visit.md");
    assert!(visit.starts_with("### Demo.visit (visitor, user_data, n_visited)\n\n"));
    assert!(visit.contains(
        "+ visitor ([Demo.Visitor](#Demo.Visitor)) _(scope call) (closure user_data)_: \n"
    ));
    assert!(visit.contains("+ user_data (gpointer) _(nullable) (allow-none)_: \n"));
    assert!(visit.contains("+ n_visited (guint) _(out) (transfer full)_: \n"));
    assert!(visit.contains(
        "Returns ([utf8]) _(nullable) (transfer full) (array length=n_visited)_: \
         the visited names\n\n"
    ));

    assert!(read(&dir, "Demo.Foo.baz.md").contains("Returns (gboolean)\n\n"));
    assert!(read(&dir, "Demo.Foo.new.md")
        .contains("Returns ([Demo.Foo](#Demo.Foo)) _(transfer full)_\n\n"));
    assert!(!read(&dir, "Demo.Foo.bar.md").contains("Returns"));
}

#[test]
fn constants_and_callbacks_are_documented() {
    let dir = TempDir::new().unwrap();
    run(&dir, &[]).success();

    let visit = read(&dir, "Demo.visit.md");
    assert!(visit.contains(
        "Walks up to [Demo.VERSION](#Demo.VERSION) objects with a [Demo.Visitor](#Demo.Visitor). \
         The class layout is Demo.FooClass."
    ));
    assert!(read(&dir, "Demo.VERSION.md")
        .starts_with("### Demo.VERSION\n\nValue: `3`\n\nThe library version."));

    let visitor = read(&dir, "Demo.Visitor.md");
    assert!(visitor.starts_with("### Demo.Visitor (foo, user_data)\n\n+ foo ([Demo.Foo](#Demo.Foo)): \n"));
    assert!(visitor.contains("Returns (gboolean): %TRUE to continue\n\n"));
    assert!(visitor.contains("Called once per visited [Demo.Foo](#Demo.Foo)."));
}

#[test]
fn doc_sections_render_headings() {
    let dir = TempDir::new().unwrap();
    run(&dir, &[]).success();
    assert_eq!(
        read(&dir, "overview.md"),
        "# overview\n\n# Overview\n\nStart with [Demo.Foo](#Demo.Foo).\n\n"
    );
}

// -- includes --

#[test]
fn markdown_include_path_splices_files() {
    let dir = TempDir::new().unwrap();
    run(&dir, &["-M", &fixture_path("snippets")]).success();
    assert!(read(&dir, "Demo.md").contains("included text about [Demo.Foo](#Demo.Foo)"));
}

#[test]
fn missing_include_warns_and_stays_literal() {
    let dir = TempDir::new().unwrap();
    run(&dir, &[])
        .success()
        .stderr(predicate::str::contains("could not find file example.txt"))
        .stderr(predicate::str::contains("could not find file notfound.txt"));

    assert!(read(&dir, "Demo.md").contains("See [Demo.Foo](#Demo.Foo) and {{ example.txt }}"));
    assert!(read(&dir, "Demo.Foo.md").contains("```\n\n{{ notfound.txt }}\n```\n"));
}

#[test]
fn missing_gir_include_is_a_warning() {
    let dir = TempDir::new().unwrap();
    cmd()
        .arg(fixture_path("Demo-1.0.gir"))
        .args(["-o", dir.path().to_str().unwrap()])
        .args(["-l", "c"])
        .assert()
        .success()
        .stderr(predicate::str::contains(
            "could not find included repository GObject-2.0.gir",
        ));
    // the unresolved base keeps its spelling from the repository
    assert!(read(&dir, "DemoFoo.md").contains("Extends: GObject.Object\n\n"));
}

// -- sections and aggregation --

#[test]
fn generates_sections_file() {
    let dir = TempDir::new().unwrap();
    run(&dir, &[]).success();

    let sections = read(&dir, "Demo-sections.txt");
    assert!(sections.starts_with(
        "<SECTIONS>\n  <SECTION>\n    <SYMBOL>Demo</SYMBOL>\n    <SYMBOLS />\n  </SECTION>\n"
    ));
    assert!(sections.contains("      <SYMBOL>Demo.Foo.new</SYMBOL>\n"));
    assert!(!sections.contains("FooClass"));
    assert!(!sections.contains("Demo.Foo.hidden"));
    assert!(sections.ends_with("</SECTIONS>\n"));
}

#[test]
fn generated_sections_can_be_fed_back() {
    let first = TempDir::new().unwrap();
    run(&first, &[]).success();
    let sections = first.path().join("Demo-sections.txt");

    let second = TempDir::new().unwrap();
    run(&second, &["-u", sections.to_str().unwrap()]).success();

    for page in ["Demo.Foo.md", "Demo.init.md", "index.md"] {
        assert_eq!(read(&first, page), read(&second, page), "{} differs", page);
    }
}

#[test]
fn class_page_follows_sections_file() {
    let dir = TempDir::new().unwrap();
    run(&dir, &["-u", &fixture_path("Demo-sections.txt")]).success();
    assert!(!dir.path().join("Demo-sections.txt").exists());

    let foo = read(&dir, "Demo.Foo.md");
    let properties = position(&foo, "## Properties:\n\n### Demo.Foo-label");
    let methods = position(&foo, "## Methods:\n\n");
    let baz = position(&foo, "### Demo.Foo.baz (self)");
    let bar = position(&foo, "### Demo.Foo.bar (self, count)");
    let signals = position(&foo, "## Signals:\n\n### Demo.Foo-changed");
    assert!(properties < methods && methods < baz && baz < bar && bar < signals);

    // not listed in the section
    assert!(!foo.contains("### Demo.Foo.new"));
    assert!(!foo.contains("Virtual Functions"));
}

#[test]
fn slate_index_lists_pages_in_section_order() {
    let dir = TempDir::new().unwrap();
    run(&dir, &["-u", &fixture_path("Demo-sections.txt")]).success();

    let index = read(&dir, "index.md");
    assert!(index.starts_with("---\ntitle: Demo\n\nlanguage_tabs:\n  - c\n\n"));
    assert!(index.contains("includes:\n  - Demo\n  - Demo.init\n  - overview\n  - Demo.Foo\n\nsearch: true\n---\n"));
}

#[test]
fn write_sections_overrides_sections_file() {
    let dir = TempDir::new().unwrap();
    run(&dir, &["-s", "-u", &fixture_path("Demo-sections.txt")]).success();
    assert!(dir.path().join("Demo-sections.txt").is_file());
    assert!(read(&dir, "Demo.Foo.md").contains("### Demo.Foo.new"));
}

#[test]
fn no_aggregation_keeps_members_separate() {
    let dir = TempDir::new().unwrap();
    run(&dir, &["--no-aggregation", "-f", "markdown"]).success();

    assert!(!read(&dir, "Demo.Foo.md").contains("## Methods:"));
    assert!(read(&dir, "index.md").contains("* [Demo.Foo.bar](Demo.Foo.bar.md)\n"));
}

// -- conventions and formats --

#[test]
fn c_convention_names() {
    let dir = TempDir::new().unwrap();
    run(&dir, &["-l", "c"]).success();

    for page in [
        "Demo.md",
        "DemoFoo.md",
        "demo_foo_new.md",
        "demo_foo_hidden.md",
        "DemoFoo-changed.md",
        "demo_init.md",
        "Demo-sections.txt",
    ] {
        assert!(dir.path().join(page).is_file(), "missing {}", page);
    }
    assert!(read(&dir, "demo_foo_baz.md").starts_with("### demo_foo_baz (self, error)"));
    assert!(read(&dir, "demo_foo_hidden.md").starts_with("### demo_foo_hidden (self, ...)"));
    assert!(read(&dir, "demo_init.md").contains("[DEMO_ALIGN_START](#DemoAlign)"));
    assert!(read(&dir, "DemoFoo.md").contains("Extends: GObject\n\n"));
    assert!(read(&dir, "DemoAlign.md").contains("+ DEMO_ALIGN_START: Leading edge.\n"));
    assert!(dir.path().join("DEMO_VERSION.md").is_file());
    assert!(dir.path().join("DemoVisitor.md").is_file());

    let baz = read(&dir, "demo_foo_baz.md");
    assert!(baz.contains("+ self ([DemoFoo](#DemoFoo)*): \n"));
    assert!(baz.contains("+ error (GError**): "));

    let visit = read(&dir, "demo_visit.md");
    assert!(visit.contains("[DEMO_VERSION](#DEMO_VERSION)"));
    assert!(visit.contains("+ visitor ([DemoVisitor](#DemoVisitor)) _(scope call) (closure user_data)_: \n"));
    assert!(visit.contains("+ n_visited (guint*) _(out) (transfer full)_: \n"));
    assert!(visit.contains("Returns (gchar**) _(nullable)"));
}

#[test]
fn search_order_prefers_named_namespace() {
    let dir = TempDir::new().unwrap();
    run(&dir, &["--search-order", "GObject"]).success();
    // the C type still names the Demo class
    assert!(read(&dir, "Demo.init.md").contains("[Demo.Foo.new](#Demo.Foo.new)"));
}

#[test]
fn html_output() {
    let dir = TempDir::new().unwrap();
    run(&dir, &["-f", "html"]).success();

    let foo = read(&dir, "Demo.Foo.html");
    assert!(foo.contains("<h2 id=\"Demo.Foo\">Demo.Foo</h2>"));
    assert!(foo.contains("<p>Extends: GObject.Object</p>"));
    assert!(foo.contains("<a href=\"Demo.Foo-label.html\">Demo.Foo-label</a>"));
    assert!(read(&dir, "Demo.Align.html").contains("<dt><code>Demo.Align.START</code></dt>"));

    let index = read(&dir, "index.html");
    assert!(index.starts_with("<!DOCTYPE html>"));
    assert!(index.contains("<li><a href=\"Demo.Foo.html\">Demo.Foo</a></li>"));
}

#[test]
fn compatibility_flags_are_accepted() {
    let dir = TempDir::new().unwrap();
    run(&dir, &["-O", "-g", "-R"]).success();
}

#[test]
fn verbose_logs_pages() {
    let dir = TempDir::new().unwrap();
    run(&dir, &["-v"])
        .success()
        .stderr(predicate::str::contains("handling Class Demo.Foo"));
}
