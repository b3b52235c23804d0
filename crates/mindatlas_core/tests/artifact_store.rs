use mindatlas_core::db::open_db_in_memory;
use mindatlas_core::{
    Artifact, ArtifactDraft, ArtifactListQuery, ArtifactPatch, ArtifactRepository,
    ArtifactValidationError, EnrichmentState, RepoError, SqliteArtifactRepository,
};
use rusqlite::Connection;
use std::collections::{BTreeSet, HashSet};
use uuid::Uuid;

fn draft(title: &str) -> ArtifactDraft {
    ArtifactDraft::new(title, "something happened", "calm").with_keywords("sea, walk, ")
}

fn stored(repo: &SqliteArtifactRepository<'_>, title: &str) -> Artifact {
    repo.create_artifact(&Artifact::from_draft(draft(title)))
        .unwrap()
}

fn link_rows(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM artifact_links;", [], |row| row.get(0))
        .unwrap()
}

#[test]
fn create_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteArtifactRepository::try_new(&conn).unwrap();

    let created = stored(&repo, "first");
    let loaded = repo.get_artifact(created.id).unwrap().unwrap();

    assert_eq!(loaded, created);
    assert_eq!(loaded.keywords, vec!["sea".to_string(), "walk".to_string()]);
    assert_eq!(loaded.enrichment, EnrichmentState::Created);
    assert_eq!(loaded.color, "#808080");
    assert!(loaded.created_at > 0);
}

#[test]
fn create_rejects_blank_fields() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteArtifactRepository::try_new(&conn).unwrap();

    let blank = Artifact::from_draft(ArtifactDraft::new("  ", "body", "calm"));
    assert!(matches!(
        repo.create_artifact(&blank),
        Err(RepoError::Validation(ArtifactValidationError::EmptyTitle))
    ));
    assert_eq!(repo.count_artifacts().unwrap(), 0);
}

#[test]
fn link_batch_is_symmetric_and_idempotent() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteArtifactRepository::try_new(&conn).unwrap();
    let a = stored(&repo, "a");
    let b = stored(&repo, "b");

    repo.link_artifacts(&[(a.id, b.id)]).unwrap();
    repo.link_artifacts(&[(b.id, a.id)]).unwrap();

    let a = repo.get_artifact(a.id).unwrap().unwrap();
    let b = repo.get_artifact(b.id).unwrap().unwrap();
    assert!(a.linked_to.contains(&b.id));
    assert!(b.linked_to.contains(&a.id));
    assert_eq!(a.linked_to.len(), 1);
    assert_eq!(link_rows(&conn), 2);
}

#[test]
fn link_batch_with_unknown_id_writes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteArtifactRepository::try_new(&conn).unwrap();
    let a = stored(&repo, "a");
    let b = stored(&repo, "b");
    let ghost = Uuid::new_v4();

    let err = repo
        .link_artifacts(&[(a.id, b.id), (a.id, ghost)])
        .unwrap_err();

    assert!(matches!(err, RepoError::UnknownArtifact(id) if id == ghost));
    assert_eq!(link_rows(&conn), 0);
}

#[test]
fn self_link_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteArtifactRepository::try_new(&conn).unwrap();
    let a = stored(&repo, "a");

    assert!(matches!(
        repo.link_artifacts(&[(a.id, a.id)]),
        Err(RepoError::Validation(ArtifactValidationError::SelfLink(_)))
    ));
}

#[test]
fn delete_cascades_links() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteArtifactRepository::try_new(&conn).unwrap();
    let a = stored(&repo, "a");
    let b = stored(&repo, "b");
    let c = stored(&repo, "c");
    repo.link_artifacts(&[(a.id, b.id), (a.id, c.id), (b.id, c.id)])
        .unwrap();

    repo.delete_artifact(a.id).unwrap();

    assert!(repo.get_artifact(a.id).unwrap().is_none());
    for remaining in repo.list_all_artifacts().unwrap() {
        assert!(!remaining.linked_to.contains(&a.id));
    }
    let b = repo.get_artifact(b.id).unwrap().unwrap();
    assert_eq!(b.linked_to, BTreeSet::from([c.id]));
    assert!(matches!(
        repo.delete_artifact(a.id),
        Err(RepoError::ArtifactNotFound(_))
    ));
}

#[test]
fn unlink_removes_both_directions() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteArtifactRepository::try_new(&conn).unwrap();
    let a = stored(&repo, "a");
    let b = stored(&repo, "b");
    repo.link_artifacts(&[(a.id, b.id)]).unwrap();

    repo.unlink_artifacts(b.id, a.id).unwrap();

    assert_eq!(link_rows(&conn), 0);
    assert!(repo.get_artifact(a.id).unwrap().unwrap().linked_to.is_empty());
}

#[test]
fn partial_update_keeps_untouched_fields_and_links() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteArtifactRepository::try_new(&conn).unwrap();
    let a = stored(&repo, "a");
    let b = stored(&repo, "b");
    repo.link_artifacts(&[(a.id, b.id)]).unwrap();

    let patch = ArtifactPatch {
        title: Some("renamed".to_string()),
        ..ArtifactPatch::default()
    };
    let updated = repo.update_artifact(a.id, &patch).unwrap();

    assert_eq!(updated.title, "renamed");
    assert_eq!(updated.content, a.content);
    assert_eq!(updated.keywords, a.keywords);
    assert!(updated.linked_to.contains(&b.id));
}

#[test]
fn update_unknown_artifact_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteArtifactRepository::try_new(&conn).unwrap();
    let patch = ArtifactPatch {
        content: Some("x".to_string()),
        ..ArtifactPatch::default()
    };

    assert!(matches!(
        repo.update_artifact(Uuid::new_v4(), &patch),
        Err(RepoError::ArtifactNotFound(_))
    ));
}

#[test]
fn set_color_marks_enriched_and_validates() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteArtifactRepository::try_new(&conn).unwrap();
    let a = stored(&repo, "a");

    assert!(matches!(
        repo.set_artifact_color(a.id, "red"),
        Err(RepoError::Validation(ArtifactValidationError::InvalidColor(_)))
    ));
    repo.set_artifact_color(a.id, "#112233").unwrap();

    let loaded = repo.get_artifact(a.id).unwrap().unwrap();
    assert_eq!(loaded.color, "#112233");
    assert!(loaded.is_enriched());
}

#[test]
fn keyset_pagination_visits_every_artifact_once_in_list_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteArtifactRepository::try_new(&conn).unwrap();
    for n in 0..5 {
        stored(&repo, &format!("artifact {n}"));
    }

    let mut visited = Vec::new();
    let mut query = ArtifactListQuery {
        limit: Some(2),
        after: None,
    };
    loop {
        let page = repo.list_artifacts(&query).unwrap();
        assert_eq!(page.applied_limit, 2);
        visited.extend(page.items.iter().map(|artifact| artifact.id));
        match page.next_cursor {
            Some(cursor) => query.after = Some(cursor),
            None => break,
        }
    }

    let expected: Vec<Uuid> = repo
        .list_all_artifacts()
        .unwrap()
        .into_iter()
        .map(|artifact| artifact.id)
        .collect();
    assert_eq!(visited, expected);
    assert_eq!(visited.iter().collect::<HashSet<_>>().len(), 5);
    assert_eq!(repo.count_artifacts().unwrap(), 5);
}
