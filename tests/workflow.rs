// tests/workflow.rs

//! End-to-end migration workflow: extract archives, install the resulting
//! text packages, move content between classes and uninstall.

mod common;

use common::{build_archive, setup_repository, write_text_package};
use ezpkg::{ContentClassStore, ContentObjectStore, Error, Migrator, SilentProgress};
use std::fs;

#[test]
fn test_extract_then_install_text_package() {
    let (temp_dir, repo) = setup_repository();
    let incoming = temp_dir.path().join("incoming");
    fs::create_dir_all(&incoming).unwrap();
    build_archive(
        &incoming.join("blog-1.0-1.ezpkg"),
        "blog",
        &[("article", 10), ("blog_post", 10)],
    );

    let mut migrator = Migrator::new(&repo);
    let report = migrator
        .extract_and_transform(
            &format!("{}/*.ezpkg", incoming.display()),
            &SilentProgress::new(),
        )
        .unwrap();
    assert_eq!(report.packages.len(), 1);
    assert_eq!(report.definitions, 2);
    assert_eq!(report.transformed, 0);

    migrator.load_package(&incoming, "blog").unwrap();
    assert!(migrator.install(true));

    let classes = repo.classes_of_package("blog").unwrap();
    let mut identifiers: Vec<_> = classes.iter().map(|c| c.identifier.as_str()).collect();
    identifiers.sort();
    assert_eq!(identifiers, ["article", "blog_post"]);

    let records = repo.packages().unwrap();
    assert_eq!(records.len(), 1);
    assert!(records[0].installed);
    assert_eq!(records[0].installed_by, Some(ezpkg::config::DEFAULT_USER_ID));
}

#[test]
fn test_load_missing_package_reports_error() {
    let (temp_dir, repo) = setup_repository();
    let mut migrator = Migrator::new(&repo);

    let err = migrator
        .load_package(temp_dir.path().join("text"), "blog")
        .unwrap_err();
    assert!(matches!(err, Error::Load(_)));
    assert!(migrator.package().is_none());
}

#[test]
fn test_version_check_keeps_newer_classes() {
    let (temp_dir, repo) = setup_repository();
    let text = temp_dir.path().join("text");

    write_text_package(&text, "blog", &[("article", 20)]);
    let mut migrator = Migrator::new(&repo);
    migrator.load_package(&text, "blog").unwrap();
    assert!(migrator.install(true));

    write_text_package(&text, "blog", &[("article", 5)]);
    migrator.load_package(&text, "blog").unwrap();
    assert!(migrator.install(true));
    let article = repo.fetch_class_by_identifier("article").unwrap().unwrap();
    assert_eq!(article.modified, 20);

    assert!(migrator.install(false));
    let article = repo.fetch_class_by_identifier("article").unwrap().unwrap();
    assert_eq!(article.modified, 5);
}

#[test]
fn test_change_class_then_uninstall() {
    let (temp_dir, repo) = setup_repository();
    let text = temp_dir.path().join("text");
    write_text_package(&text, "blog", &[("article", 1)]);
    write_text_package(&text, "news", &[("news_item", 1)]);

    let mut blog = Migrator::new(&repo);
    blog.load_package(&text, "blog").unwrap();
    assert!(blog.install(true));

    let mut news = Migrator::new(&repo);
    news.load_package(&text, "news").unwrap();
    assert!(news.install(true));

    let object = repo.create_object("Launch", "article").unwrap();
    repo.cache_view(object.id, "full", "<h1>Launch</h1>").unwrap();

    // Blog classes are still in use
    assert!(!blog.uninstall());
    assert_eq!(repo.classes_of_package("blog").unwrap().len(), 1);

    blog.change_class_identifier_of_object(object.id, "news_item")
        .unwrap();
    let moved = repo.fetch_object(object.id).unwrap().unwrap();
    assert_eq!(moved.class_identifier, "news_item");
    assert_eq!(repo.cached_views(object.id).unwrap(), 0);

    assert!(blog.uninstall());
    assert!(repo.classes_of_package("blog").unwrap().is_empty());
    assert!(!news.uninstall());
}

#[test]
fn test_change_class_unknown_references() {
    let (temp_dir, repo) = setup_repository();
    let text = temp_dir.path().join("text");
    write_text_package(&text, "blog", &[("article", 1)]);

    let mut migrator = Migrator::new(&repo);
    migrator.load_package(&text, "blog").unwrap();
    assert!(migrator.install(true));
    let object = repo.create_object("Hello", "article").unwrap();

    let err = migrator
        .change_class_identifier_of_object(object.id, "missing")
        .unwrap_err();
    assert!(matches!(err, Error::InvalidReference(_)));

    let err = migrator
        .change_class_identifier_of_object(object.id + 100, "article")
        .unwrap_err();
    assert!(matches!(err, Error::InvalidReference(_)));

    let unchanged = repo.fetch_object(object.id).unwrap().unwrap();
    assert_eq!(unchanged.class_identifier, "article");
}
