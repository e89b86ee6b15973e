use chrono::{Duration, Utc};
use gtmpl::Value;
use pretty_assertions::assert_eq;
use sitebuild::build::{build_site, BuildSummary, SiteBuilder};
use sitebuild::config::{self, Config, Overrides};
use sitebuild::discover::load_posts;
use sitebuild::graph::ContentGraph;
use sitebuild::slug::Layout;
use sitebuild::render::{self, Renderer};
use std::cell::RefCell;
use std::fs;
use std::io::Write;
use tempfile::TempDir;

/// Records every render call and writes the template name as the page body.
#[derive(Default)]
struct Recorder {
    calls: RefCell<Vec<(String, Value)>>,
}

impl Renderer for Recorder {
    fn render(&self, template: &str, page: &Value, w: &mut dyn Write) -> render::Result<()> {
        self.calls
            .borrow_mut()
            .push((template.to_owned(), page.clone()));
        write!(w, "{}", template).map_err(|err| render::Error::Read {
            path: template.into(),
            err,
        })
    }
}

impl Recorder {
    fn templates(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|(t, _)| t.clone()).collect()
    }

    fn page(&self, template: &str) -> Value {
        self.calls
            .borrow()
            .iter()
            .find(|(t, _)| t == template)
            .map(|(_, page)| page.clone())
            .unwrap()
    }
}

fn field<'v>(value: &'v Value, key: &str) -> &'v Value {
    match value {
        Value::Object(m) => &m[key],
        _ => panic!("not an object: {}", key),
    }
}

fn titles(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| match field(item, "title") {
                Value::String(s) => s.clone(),
                _ => panic!("title is not a string"),
            })
            .collect(),
        _ => panic!("not an array"),
    }
}

fn site(posts: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for name in &["posts", "static", "templates"] {
        fs::create_dir_all(dir.path().join(name)).unwrap();
    }
    fs::write(dir.path().join("index.md"), "title: Home\n$endmeta\nWelcome.\n").unwrap();
    for (name, text) in posts {
        let path = dir.path().join("posts").join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }
    dir
}

fn write_templates(dir: &TempDir, templates: &[(&str, &str)]) {
    for (name, text) in templates {
        fs::write(dir.path().join("templates").join(name), text).unwrap();
    }
}

fn three_posts() -> TempDir {
    site(&[
        ("y.md", "title: Y\ntags: y\npostdate: 2019-12-31 10:00 UTC\n$endmeta\nyear end\n"),
        ("x.md", "title: X\ntags: x\npostdate: 2020-01-01 10:00 UTC\n$endmeta\nnew year\n"),
        (
            "2020/xy.md",
            "title: XY\ntags: x, y\npostdate: 2020-06-01 10:00 UTC\n$endmeta\nsummer\n",
        ),
    ])
}

#[test]
fn test_tag_counts() {
    let dir = three_posts();
    let config = Config::load(dir.path(), Overrides::default()).unwrap();
    let posts = load_posts(&config).unwrap();
    let graph = ContentGraph::from_posts(&posts);

    assert_eq!(posts.len(), 3);
    assert_eq!(graph.post_count("x"), 2);
    assert_eq!(graph.post_count("y"), 2);
    assert_eq!(graph.post_count("X"), 2);
}

#[test]
fn test_render_order() {
    let dir = three_posts();
    let config = Config::load(dir.path(), Overrides::default()).unwrap();
    config.prepare_deploy().unwrap();
    let recorder = Recorder::default();

    let summary = SiteBuilder::new(&config).build(&recorder).unwrap();

    assert_eq!(
        summary,
        BuildSummary {
            posts: 3,
            tags: 2,
            pages: 8,
            static_files: 0,
        }
    );
    assert_eq!(
        recorder.templates(),
        vec![
            "post.html",
            "post.html",
            "post.html",
            "tag.html",
            "tag.html",
            "tagindex.html",
            "postindex.html",
            "index.html",
        ]
    );

    let index = recorder.page("postindex.html");
    assert_eq!(titles(field(&index, "posts")), vec!["XY", "X", "Y"]);
    assert_eq!(
        titles(field(&recorder.page("tag.html"), "posts")),
        vec!["XY", "X"]
    );

    let deploy = config.deploy_directory();
    assert_eq!(
        fs::read_to_string(deploy.join("posts/xy-202006011000/index.html")).unwrap(),
        "post.html"
    );
    assert_eq!(
        fs::read_to_string(deploy.join("tags/y/index.html")).unwrap(),
        "tag.html"
    );
    assert!(deploy.join("tags/index.html").is_file());
    assert!(deploy.join("posts/index.html").is_file());
    assert!(deploy.join("index.html").is_file());
}

#[test]
fn test_post_without_header() {
    let dir = site(&[("plain.md", "Just a body.\n")]);
    let overrides = Overrides {
        tags: Some(vec![String::from("misc")]),
        ..Overrides::default()
    };
    let config = Config::load(dir.path(), overrides).unwrap();
    let posts = load_posts(&config).unwrap();

    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].title, "plain.md");
    assert_eq!(posts[0].tags, vec!["misc"]);
    assert_eq!(posts[0].html, "<p>Just a body.</p>\n");
}

#[test]
fn test_invalid_postdate_uses_now() {
    let dir = site(&[("late.md", "title: Late\npostdate: not-a-date\n$endmeta\n")]);
    let config = Config::load(dir.path(), Overrides::default()).unwrap();

    let before = Utc::now();
    let posts = load_posts(&config).unwrap();
    let after = Utc::now();

    assert!(posts[0].date >= before - Duration::seconds(1));
    assert!(posts[0].date <= after + Duration::seconds(1));
}

#[test]
fn test_build_site() {
    let dir = three_posts();
    let templates = dir.path().join("templates");
    let write = |name: &str, text: &str| fs::write(templates.join(name), text).unwrap();
    write("_head.html", r#"{{define "head"}}<title>{{.title}}</title>{{end}}"#);
    write("post.html", r#"{{template "head" .}}{{.content}}"#);
    write("tag.html", "{{range .posts}}{{.title}};{{end}}");
    write("tagindex.html", "{{range .tags}}{{.name}};{{end}}");
    write("postindex.html", "{{range .posts}}{{.title}};{{end}}");
    write("index.html", "{{.title}}");
    fs::create_dir_all(dir.path().join("static/css")).unwrap();
    fs::write(dir.path().join("static/css/site.css"), "body{}").unwrap();
    fs::create_dir_all(dir.path().join("deploy/stale")).unwrap();

    let overrides = Overrides {
        debug: true,
        ..Overrides::default()
    };
    let config = Config::load(dir.path(), overrides).unwrap();
    let summary = build_site(&config).unwrap();

    assert_eq!(summary.pages, 8);
    assert_eq!(summary.static_files, 1);

    let read = |path: &str| fs::read_to_string(config.deploy_directory().join(path)).unwrap();
    assert_eq!(read("index.html"), "Home");
    assert_eq!(read("posts/index.html"), "XY;X;Y;");
    assert_eq!(read("tags/index.html"), "x;y;");
    assert_eq!(read("tags/x/index.html"), "XY;X;");
    assert!(read("posts/x-202001011000/index.html").contains("<title>X</title>"));
    assert!(read("posts/x-202001011000/index.html").contains("<p>new year</p>"));
    assert_eq!(read("css/site.css"), "body{}");
    assert!(!config.deploy_directory().join("stale").exists());
}

#[test]
fn test_missing_template_fails() {
    let dir = three_posts();
    fs::write(dir.path().join("templates/post.html"), "{{.title}}").unwrap();
    let config = Config::load(dir.path(), Overrides::default()).unwrap();

    let err = build_site(&config).unwrap_err();
    assert!(format!("{}", err).starts_with("rendering"));
}

#[test]
fn test_missing_directory_fails() {
    let dir = site(&[]);
    fs::remove_dir_all(dir.path().join("static")).unwrap();

    let err = Config::load(dir.path(), Overrides::default()).unwrap_err();
    assert!(matches!(err, config::Error::Missing(path) if path.ends_with("static")));
    assert!(!dir.path().join("deploy").exists());
}

#[test]
fn test_build_dated_layout() {
    let dir = three_posts();
    write_templates(
        &dir,
        &[
            ("post.html", "{{.path}}"),
            ("tag.html", "{{range .posts}}{{.path}};{{end}}"),
            ("tagindex.html", "TAGS"),
            ("postindex.html", "{{range .posts}}{{.path}};{{end}}"),
            ("index.html", "{{.title}}"),
        ],
    );
    let overrides = Overrides {
        layout: Some(Layout::Dated),
        debug: true,
        ..Overrides::default()
    };
    let config = Config::load(dir.path(), overrides).unwrap();
    build_site(&config).unwrap();

    let read = |path: &str| fs::read_to_string(config.deploy_directory().join(path)).unwrap();
    assert_eq!(read("posts/2020/01/01/x.html"), "/posts/2020/01/01/x.html");
    assert_eq!(read("posts/2019/12/31/y.html"), "/posts/2019/12/31/y.html");
    assert_eq!(read("posts/2020/06/01/xy.html"), "/posts/2020/06/01/xy.html");
    assert_eq!(
        read("posts/index.html"),
        "/posts/2020/06/01/xy.html;/posts/2020/01/01/x.html;/posts/2019/12/31/y.html;"
    );
    assert_eq!(
        read("tags/y/index.html"),
        "/posts/2020/06/01/xy.html;/posts/2019/12/31/y.html;"
    );
}

#[test]
fn test_dot_tags_do_not_overwrite_pages() {
    let dir = site(&[(
        "dots.md",
        "title: Dots\ntags: .., ../../escape, .\npostdate: 2020-01-01 10:00 UTC\n$endmeta\n",
    )]);
    write_templates(
        &dir,
        &[
            ("post.html", "POST"),
            ("tag.html", "TAG {{.tag.name}} {{.tag.path}}"),
            ("tagindex.html", "TAGINDEX"),
            ("postindex.html", "POSTINDEX"),
            ("index.html", "FRONT"),
        ],
    );
    let overrides = Overrides {
        debug: true,
        ..Overrides::default()
    };
    let config = Config::load(dir.path(), overrides).unwrap();
    let summary = build_site(&config).unwrap();

    assert_eq!(summary.tags, 3);
    assert_eq!(summary.pages, 7);
    let read = |path: &str| fs::read_to_string(config.deploy_directory().join(path)).unwrap();
    assert_eq!(read("index.html"), "FRONT");
    assert_eq!(read("tags/index.html"), "TAGINDEX");
    assert_eq!(read("tags/--/index.html"), "TAG .. /tags/--/");
    assert_eq!(read("tags/-/index.html"), "TAG . /tags/-/");
    assert_eq!(
        read("tags/..-..-escape/index.html"),
        "TAG ../../escape /tags/..-..-escape/"
    );
}
