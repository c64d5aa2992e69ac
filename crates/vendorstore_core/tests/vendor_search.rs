use rusqlite::Connection;
use std::collections::HashSet;
use vendorstore_core::db::open_db_in_memory;
use vendorstore_core::{
    validate_filters, FilterSpec, JsonGenreContainment, LikeTitleSearch, Metadata, NewVendor,
    RepoError, Runtime, SqliteVendorRepository, ValidatedFilters, VendorRepository,
};

fn seed(repo: &impl VendorRepository) {
    let rows = [
        ("Casablanca", 1942, 102, vec!["Drama", "Romance"]),
        ("The Third Man", 1949, 104, vec!["Thriller", "Mystery"]),
        ("Roman Holiday", 1953, 118, vec!["Comedy", "Romance"]),
        ("The Apartment", 1960, 125, vec!["Comedy", "Drama", "Romance"]),
        ("Black Panther", 2018, 134, vec!["Action", "Adventure"]),
        ("The Breakfast Club", 1985, 97, vec!["Comedy", "Drama"]),
    ];
    for (title, year, runtime, genres) in rows {
        repo.insert(&NewVendor::new(title, year, Runtime(runtime), genres))
            .unwrap();
    }
}

fn filters(page: i64, page_size: i64, sort: &str) -> ValidatedFilters {
    validate_filters(&FilterSpec {
        page,
        page_size,
        sort: sort.to_string(),
        ..FilterSpec::default()
    })
    .unwrap()
}

fn titles(repo: &impl VendorRepository, title: &str, genres: &[&str], f: ValidatedFilters) -> Vec<String> {
    let genres: Vec<String> = genres.iter().map(|genre| genre.to_string()).collect();
    repo.get_all(title, &genres, &f)
        .unwrap()
        .vendors
        .into_iter()
        .map(|vendor| vendor.title)
        .collect()
}

#[test]
fn empty_filters_return_everything() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVendorRepository::try_new(&conn).unwrap();
    seed(&repo);

    let page = repo.get_all("", &[], &filters(1, 20, "id")).unwrap();
    assert_eq!(page.vendors.len(), 6);
    assert_eq!(page.metadata.total_records, 6);
    assert_eq!(page.metadata.last_page, 1);
}

#[test]
fn title_query_matches_tokens_not_substrings() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVendorRepository::try_new(&conn).unwrap();
    seed(&repo);

    assert_eq!(titles(&repo, "the", &[], filters(1, 20, "id")), [
        "The Third Man",
        "The Apartment",
        "The Breakfast Club"
    ]);
    assert_eq!(titles(&repo, "BLACK panther", &[], filters(1, 20, "id")), ["Black Panther"]);
    // "Roman" is a token of "Roman Holiday" only, not of "Romance" genres or other titles.
    assert_eq!(titles(&repo, "roman", &[], filters(1, 20, "id")), ["Roman Holiday"]);
    assert!(titles(&repo, "cas", &[], filters(1, 20, "id")).is_empty());
}

#[test]
fn title_query_tolerates_fts_syntax_characters() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVendorRepository::try_new(&conn).unwrap();
    seed(&repo);

    for query in ["\"unterminated", "a:b", "NEAR(", "man*", "OR"] {
        repo.get_all(query, &[], &filters(1, 20, "id"))
            .unwrap_or_else(|err| panic!("query {query:?} failed: {err}"));
    }
}

#[test]
fn punctuation_only_words_do_not_filter_out_titles() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVendorRepository::try_new(&conn).unwrap();
    seed(&repo);
    repo.insert(&NewVendor::new(
        "Mission: Impossible - Fallout",
        2018,
        Runtime(147),
        ["Action"],
    ))
    .unwrap();

    assert_eq!(
        titles(&repo, "Mission: Impossible - Fallout", &[], filters(1, 20, "id")),
        ["Mission: Impossible - Fallout"]
    );
    assert_eq!(titles(&repo, "Casablanca -", &[], filters(1, 20, "id")), ["Casablanca"]);
    assert_eq!(titles(&repo, "Casablanca &", &[], filters(1, 20, "id")), ["Casablanca"]);
    assert_eq!(titles(&repo, " - & : ", &[], filters(1, 20, "id")).len(), 7);
}

#[test]
fn genre_filter_uses_containment() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVendorRepository::try_new(&conn).unwrap();
    seed(&repo);

    assert_eq!(titles(&repo, "", &["Drama"], filters(1, 20, "id")), [
        "Casablanca",
        "The Apartment",
        "The Breakfast Club"
    ]);
    assert_eq!(titles(&repo, "", &["Romance", "Comedy"], filters(1, 20, "id")), [
        "Roman Holiday",
        "The Apartment"
    ]);
    assert_eq!(titles(&repo, "", &["Drama", "Drama"], filters(1, 20, "id")).len(), 3);
    assert!(titles(&repo, "", &["drama"], filters(1, 20, "id")).is_empty());
    assert!(titles(&repo, "", &["Drama", "Western"], filters(1, 20, "id")).is_empty());
}

#[test]
fn title_and_genre_predicates_are_anded() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVendorRepository::try_new(&conn).unwrap();
    seed(&repo);

    assert_eq!(titles(&repo, "the", &["Drama"], filters(1, 20, "id")), [
        "The Apartment",
        "The Breakfast Club"
    ]);

    let page = repo
        .get_all("the", &["Drama".to_string()], &filters(1, 20, "id"))
        .unwrap();
    assert_eq!(page.metadata.total_records, 2);
}

#[test]
fn sort_direction_and_column_are_applied() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVendorRepository::try_new(&conn).unwrap();
    seed(&repo);

    assert_eq!(titles(&repo, "", &[], filters(1, 3, "-year")), [
        "Black Panther",
        "The Breakfast Club",
        "The Apartment"
    ]);
    assert_eq!(titles(&repo, "", &[], filters(1, 2, "runtime")), [
        "The Breakfast Club",
        "Casablanca"
    ]);
    assert_eq!(titles(&repo, "", &[], filters(1, 1, "title")), ["Black Panther"]);
}

#[test]
fn equal_sort_keys_page_without_duplicates_or_gaps() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVendorRepository::try_new(&conn).unwrap();
    for index in 0..7 {
        repo.insert(&NewVendor::new(
            format!("Same Year {index}"),
            1999,
            Runtime(90),
            ["Drama"],
        ))
        .unwrap();
    }

    let mut seen = Vec::new();
    for page in 1..=4 {
        let result = repo.get_all("", &[], &filters(page, 2, "-year")).unwrap();
        let ids: Vec<i64> = result.vendors.iter().map(|vendor| vendor.id).collect();
        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]), "ids ascend within ties");
        seen.extend(ids);
    }

    assert_eq!(seen.len(), 7);
    assert_eq!(seen.iter().collect::<HashSet<_>>().len(), 7);
}

#[test]
fn page_size_bounds_every_page() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVendorRepository::try_new(&conn).unwrap();
    seed(&repo);

    for page_size in [1, 2, 5, 6, 100] {
        let page = repo.get_all("", &[], &filters(1, page_size, "id")).unwrap();
        assert!(page.vendors.len() as i64 <= page_size);
        assert_eq!(page.vendors.len() as i64, page_size.min(6));
        assert_eq!(page.metadata.page_size, page_size);
        assert_eq!(page.metadata.last_page, (6 + page_size - 1) / page_size);
    }
}

#[test]
fn page_past_the_end_is_empty_with_full_metadata() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVendorRepository::try_new(&conn).unwrap();
    seed(&repo);

    let page = repo.get_all("", &[], &filters(9, 4, "id")).unwrap();
    assert!(page.vendors.is_empty());
    assert_eq!(
        page.metadata,
        Metadata {
            current_page: 9,
            page_size: 4,
            first_page: 1,
            last_page: 2,
            total_records: 6,
        }
    );
}

#[test]
fn no_matches_yield_zero_metadata() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVendorRepository::try_new(&conn).unwrap();
    seed(&repo);

    let page = repo.get_all("nonexistent", &[], &filters(3, 10, "id")).unwrap();
    assert!(page.vendors.is_empty());
    assert_eq!(page.metadata, Metadata::default());

    let empty_conn = open_db_in_memory().unwrap();
    let empty_repo = SqliteVendorRepository::try_new(&empty_conn).unwrap();
    let page = empty_repo.get_all("", &[], &filters(1, 20, "id")).unwrap();
    assert!(page.metadata.is_empty());
}

#[test]
fn index_follows_title_updates_and_deletes() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVendorRepository::try_new(&conn).unwrap();

    let vendor = repo
        .insert(&NewVendor::new("Alpha Picture", 2001, Runtime(90), ["Drama"]))
        .unwrap();
    let mut renamed = vendor.clone();
    renamed.title = "Beta Picture".to_string();
    repo.update(&renamed).unwrap();

    assert!(titles(&repo, "alpha", &[], filters(1, 20, "id")).is_empty());
    assert_eq!(titles(&repo, "beta", &[], filters(1, 20, "id")), ["Beta Picture"]);

    repo.delete(vendor.id).unwrap();
    assert!(titles(&repo, "beta", &[], filters(1, 20, "id")).is_empty());
}

#[test]
fn like_capability_can_replace_the_fts_index() {
    let conn = open_db_in_memory().unwrap();
    let repo =
        SqliteVendorRepository::with_capabilities(&conn, LikeTitleSearch, JsonGenreContainment)
            .unwrap();
    seed(&repo);

    assert_eq!(titles(&repo, "cas", &[], filters(1, 20, "id")), ["Casablanca"]);
    assert_eq!(titles(&repo, "the man", &["Mystery"], filters(1, 20, "id")), ["The Third Man"]);
    assert!(titles(&repo, "100%", &[], filters(1, 20, "id")).is_empty());
}

#[test]
fn exhausted_deadline_surfaces_as_timeout() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVendorRepository::try_new(&conn).unwrap();
    bulk_insert(&conn, 500);

    let repo = repo.with_op_timeout(std::time::Duration::ZERO);
    let err = repo
        .get_all("", &["Drama".to_string()], &filters(1, 20, "title"))
        .unwrap_err();
    assert!(matches!(err, RepoError::Timeout(_)), "unexpected error: {err}");
    assert!(err.is_retryable());
}

fn bulk_insert(conn: &Connection, count: usize) {
    let tx = conn.unchecked_transaction().unwrap();
    for index in 0..count {
        tx.execute(
            "INSERT INTO vendors (title, year, runtime, genres) VALUES (?1, 2000, 90, '[\"Drama\",\"Comedy\"]');",
            [format!("Bulk {index}")],
        )
        .unwrap();
    }
    tx.commit().unwrap();
}
