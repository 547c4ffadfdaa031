//! Search service lifecycle and query behavior.

use time::macros::datetime;

use tidepool::application::search::{
    DEFAULT_SEARCH_LIMIT, SearchService, SearchableContent,
};
use tidepool::domain::posts::{Post, TagRef};
use tidepool::domain::types::ContentKind;

fn entry(id: &str, title: &str, tags: &[&str], kind: ContentKind) -> SearchableContent {
    SearchableContent {
        id: id.to_string(),
        title: title.to_string(),
        description: format!("about {title}"),
        slug: id.to_string(),
        tags: tags.iter().map(|tag| tag.to_string()).collect(),
        kind,
        body: None,
        published_at: None,
        created_at: datetime!(2024-01-01 00:00 UTC),
    }
}

fn sample_content() -> Vec<SearchableContent> {
    vec![
        entry("j1", "Caustics in the aquarium", &["webgl"], ContentKind::Journal),
        entry("p1", "Aquarium scene", &["webgl", "threejs"], ContentKind::Project),
        entry("v1", "Aquarium walkthrough", &["video"], ContentKind::Video),
        entry("j2", "Pagination protocols", &["rust"], ContentKind::Journal),
    ]
}

#[test]
fn search_before_initialize_returns_empty_results() {
    let service = SearchService::new();
    assert!(!service.is_ready());

    let results = service.search("aquarium", DEFAULT_SEARCH_LIMIT);
    assert!(results.journal.is_empty());
    assert!(results.project.is_empty());
    assert!(results.video.is_empty());
    assert_eq!(results.total, 0);

    assert!(service.search_by_tag("webgl").is_empty());
    assert!(service.all_tags().is_empty());
}

#[test]
fn initialized_search_matches_titles() {
    let service = SearchService::new();
    service.initialize(sample_content());
    assert!(service.is_ready());

    let results = service.search("pagination", DEFAULT_SEARCH_LIMIT);
    assert_eq!(results.total, 1);
    assert_eq!(results.journal[0].id, "j2");
}

#[test]
fn empty_and_whitespace_queries_return_empty_results() {
    let service = SearchService::new();
    service.initialize(sample_content());

    for query in ["", "   ", "\t\n"] {
        let results = service.search(query, DEFAULT_SEARCH_LIMIT);
        assert!(results.journal.is_empty());
        assert!(results.project.is_empty());
        assert!(results.video.is_empty());
        assert_eq!(results.total, 0);
    }
}

#[test]
fn results_are_partitioned_by_kind() {
    let service = SearchService::new();
    service.initialize(sample_content());

    let results = service.search("aquarium", DEFAULT_SEARCH_LIMIT);
    assert_eq!(results.total, 3);
    assert_eq!(results.journal.len(), 1);
    assert_eq!(results.project.len(), 1);
    assert_eq!(results.video.len(), 1);
}

#[test]
fn second_initialize_is_a_noop() {
    let service = SearchService::new();
    service.initialize(sample_content());
    service.initialize(vec![entry(
        "late",
        "Latecomer",
        &[],
        ContentKind::Journal,
    )]);

    // The original generation is still served...
    assert_eq!(service.search("aquarium", DEFAULT_SEARCH_LIMIT).total, 3);
    // ...and the ignored batch is absent.
    assert_eq!(service.search("latecomer", DEFAULT_SEARCH_LIMIT).total, 0);
}

#[test]
fn reinitializing_with_identical_content_changes_nothing() {
    let service = SearchService::new();
    service.initialize(sample_content());
    let before: Vec<String> = service
        .search("aquarium", DEFAULT_SEARCH_LIMIT)
        .project
        .iter()
        .map(|hit| hit.id.clone())
        .collect();

    service.initialize(sample_content());
    let after: Vec<String> = service
        .search("aquarium", DEFAULT_SEARCH_LIMIT)
        .project
        .iter()
        .map(|hit| hit.id.clone())
        .collect();

    assert_eq!(before, after);
    assert_eq!(service.search("aquarium", DEFAULT_SEARCH_LIMIT).total, 3);
}

#[test]
fn rebuild_swaps_in_the_new_generation() {
    let service = SearchService::new();
    service.initialize(sample_content());

    service.rebuild(vec![entry("n1", "Fresh start", &[], ContentKind::Journal)]);

    assert_eq!(service.search("aquarium", DEFAULT_SEARCH_LIMIT).total, 0);
    assert_eq!(service.search("fresh", DEFAULT_SEARCH_LIMIT).total, 1);
}

#[test]
fn search_by_tag_is_case_insensitive_and_newest_first() {
    let mut older = entry("j1", "Older", &["WebGL"], ContentKind::Journal);
    older.published_at = Some(datetime!(2024-01-10 00:00 UTC));
    let mut newer = entry("p1", "Newer", &["webgl"], ContentKind::Project);
    newer.published_at = Some(datetime!(2024-05-10 00:00 UTC));

    let service = SearchService::new();
    service.initialize(vec![older, newer]);

    let results = service.search_by_tag("WEBGL");
    assert_eq!(results.total, 2);
    assert_eq!(results.project[0].id, "p1");
    assert_eq!(results.journal[0].id, "j1");

    assert_eq!(service.search_by_tag("nope").total, 0);
}

#[test]
fn unscheduled_entries_fall_back_to_creation_time_in_tag_order() {
    let mut scheduled = entry("a", "Scheduled", &["t"], ContentKind::Journal);
    scheduled.published_at = Some(datetime!(2024-03-01 00:00 UTC));
    let mut unscheduled = entry("b", "Unscheduled", &["t"], ContentKind::Journal);
    unscheduled.created_at = datetime!(2024-06-01 00:00 UTC);

    let service = SearchService::new();
    service.initialize(vec![scheduled, unscheduled]);

    let results = service.search_by_tag("t");
    let ids: Vec<&str> = results.journal.iter().map(|hit| hit.id.as_str()).collect();
    assert_eq!(ids, vec!["b", "a"]);
}

#[test]
fn all_tags_aggregates_counts_and_kinds() {
    let service = SearchService::new();
    service.initialize(vec![
        entry("one", "One", &["a", "b"], ContentKind::Journal),
        entry("two", "Two", &["b"], ContentKind::Project),
        entry("three", "Three", &["a"], ContentKind::Journal),
    ]);

    let tags = service.all_tags();
    assert_eq!(tags.len(), 2);

    let a = tags.iter().find(|tag| tag.name == "a").expect("tag a");
    let b = tags.iter().find(|tag| tag.name == "b").expect("tag b");
    assert_eq!(a.count, 2);
    assert_eq!(b.count, 2);
    assert_eq!(a.kinds, vec![ContentKind::Journal]);
    assert_eq!(b.kinds, vec![ContentKind::Journal, ContentKind::Project]);

    let counts: Vec<usize> = tags.iter().map(|tag| tag.count).collect();
    let mut descending = counts.clone();
    descending.sort_by(|left, right| right.cmp(left));
    assert_eq!(counts, descending);
}

#[test]
fn content_by_kind_lists_one_category_newest_first() {
    let mut older = entry("j1", "Older journal", &[], ContentKind::Journal);
    older.published_at = Some(datetime!(2024-01-01 00:00 UTC));
    let mut newer = entry("j2", "Newer journal", &[], ContentKind::Journal);
    newer.published_at = Some(datetime!(2024-02-01 00:00 UTC));
    let project = entry("p1", "Project", &[], ContentKind::Project);

    let service = SearchService::new();
    service.initialize(vec![older, newer, project]);

    let journals = service.content_by_kind(ContentKind::Journal);
    let ids: Vec<&str> = journals.iter().map(|hit| hit.id.as_str()).collect();
    assert_eq!(ids, vec!["j2", "j1"]);
}

#[test]
fn journal_posts_convert_with_tag_names_and_body() {
    let post = Post {
        id: "rec-1".to_string(),
        slug: "caustics".to_string(),
        title: "Caustics".to_string(),
        description: "light on sand".to_string(),
        image: String::new(),
        tags: vec![TagRef {
            id: "t1".to_string(),
            name: "webgl".to_string(),
        }],
        created_at: datetime!(2024-01-01 00:00 UTC),
        updated_at: datetime!(2024-01-01 00:00 UTC),
        published_at: Some(datetime!(2024-02-01 00:00 UTC)),
        author_id: String::new(),
    };

    let content = SearchableContent::from_post(&post, Some("refraction ripples".to_string()));
    assert_eq!(content.kind, ContentKind::Journal);
    assert_eq!(content.tags, vec!["webgl".to_string()]);

    let service = SearchService::new();
    service.initialize(vec![content]);

    // Body text is searchable even though hits never carry it.
    let results = service.search("refraction", DEFAULT_SEARCH_LIMIT);
    assert_eq!(results.total, 1);
    assert_eq!(results.journal[0].id, "rec-1");
}
