//! Cascade updater
//!
//! Applies a path-based mutation to one root document, persists it, then
//! propagates the change into every dependent's denormalized copy. The
//! propagation is exactly one hop: dependents of dependents keep whatever
//! copy they held. A failure to resolve a dependent's collection aborts the
//! remaining dependents and surfaces `Error::ReferenceResolution`; dependents
//! already rewritten stay rewritten (no rollback).
//!
//! The updater is a stateless facade over `Arc<Database>`; all state lives
//! in the collections it touches, and everything runs on the caller's
//! thread.

use anteroom_core::{DependentDescriptor, Document, Error, Result};
use anteroom_storage::Database;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, trace};

/// One-hop denormalized-copy propagation engine
pub struct CascadeUpdater {
    database: Arc<Database>,
}

impl CascadeUpdater {
    /// Create an updater over the given database
    pub fn new(database: Arc<Database>) -> Self {
        CascadeUpdater { database }
    }

    /// Mutate `root` at `path`/`leaf`, save it, and rewrite every
    /// dependent's embedded copy of it
    ///
    /// `path` names the field chain from the root down to the container
    /// holding `leaf`; absent or null intermediates are default-constructed
    /// as empty objects, so traversal never aborts on a hole. After the
    /// mutation the root is saved into its own collection
    /// (`Error::ReferenceResolution` when that collection cannot be
    /// located), then each dependent document whose reference field equals
    /// the root's identity gets its embedded-copy field overwritten with a
    /// clone of the root's current body and is saved back.
    pub fn update(
        &self,
        root: &mut Document,
        path: &[&str],
        leaf: &str,
        value: Value,
    ) -> Result<()> {
        root.set_at_path(path, leaf, value)?;

        let metadata = self.database.metadata().clone();
        let identity = metadata.identity(root.kind())?;
        let root_id = identity.get(root)?;

        let root_collection = self.database.collection_of(root.kind()).map_err(|e| {
            Error::reference(format!(
                "no collection for root type '{}': {e}",
                root.kind()
            ))
        })?;
        root_collection.save(&root_id, root.clone());
        trace!(kind = %root.kind(), id = %root_id, "root saved, cascading");

        for dependent in metadata.dependents(root.kind()).iter() {
            let collection = self
                .database
                .collection_of(&dependent.dependent)
                .map_err(|e| {
                    Error::reference(format!(
                        "no collection for dependent type '{}': {e}",
                        dependent.dependent
                    ))
                })?;
            let dependent_identity = metadata.identity(&dependent.dependent)?;

            let mut rewritten = 0usize;
            for doc in &collection.as_queryable() {
                if !self.references_root(doc, dependent, &root_id, identity.field()) {
                    continue;
                }
                let dependent_id = dependent_identity.get(doc)?;
                collection.update(&dependent_id, |held| {
                    held.set_field(&dependent.embed_field, root.body().clone());
                })?;
                rewritten += 1;
            }
            debug!(
                source = %dependent.source,
                dependent = %dependent.dependent,
                field = %dependent.embed_field,
                rewritten,
                "cascade hop applied"
            );
        }

        Ok(())
    }

    /// Whether `doc` holds a copy of the root identified by `root_id`
    ///
    /// Matches on the dependent's declared reference field when one exists;
    /// otherwise falls back to the identity value inside the embedded copy.
    fn references_root(
        &self,
        doc: &Document,
        dependent: &DependentDescriptor,
        root_id: &str,
        root_identity_field: &str,
    ) -> bool {
        match &dependent.reference_field {
            Some(field) => matches!(doc.field(field), Some(Value::String(s)) if s == root_id),
            None => matches!(
                doc.field_at_path(&[&dependent.embed_field, root_identity_field]),
                Some(Value::String(s)) if s == root_id
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anteroom_core::{DocumentDescriptor, Metadata, TypeName};
    use serde_json::json;

    fn database() -> Arc<Database> {
        let metadata = Arc::new(
            Metadata::builder()
                .register(
                    DocumentDescriptor::builder("user", "users")
                        .identity("UserId")
                        .build(),
                )
                .register(
                    DocumentDescriptor::builder("question", "questions")
                        .identity("QuestionId")
                        .reference("UserId", "user")
                        .embeds("UserDocument", "user")
                        .build(),
                )
                .register(
                    DocumentDescriptor::builder("comment", "comments")
                        .identity("CommentId")
                        .reference("QuestionId", "question")
                        .embeds("QuestionDocument", "question")
                        .build(),
                )
                .build(),
        );
        Arc::new(Database::new(metadata))
    }

    fn seed_user(db: &Database, id: &str, name: &str) -> Document {
        let doc = Document::new(
            "user",
            json!({
                "UserId": id,
                "Name": name,
                "Student": { "StudentId": "student1", "School": "MIT" }
            }),
        )
        .unwrap();
        db.collection_of(&TypeName::from("user"))
            .unwrap()
            .save(id, doc.clone());
        doc
    }

    fn seed_question(db: &Database, id: &str, user_id: &str, user_body: &Document) {
        let doc = Document::new(
            "question",
            json!({
                "QuestionId": id,
                "UserId": user_id,
                "Question": "why?",
                "UserDocument": user_body.body().clone()
            }),
        )
        .unwrap();
        db.collection_of(&TypeName::from("question"))
            .unwrap()
            .save(id, doc);
    }

    #[test]
    fn test_path_update_sets_nested_leaf() {
        let db = database();
        let mut user = seed_user(&db, "user1", "Alice");
        let updater = CascadeUpdater::new(db.clone());

        updater
            .update(&mut user, &["Student"], "StudentId", json!("student_new"))
            .unwrap();

        assert_eq!(
            user.field_at_path(&["Student", "StudentId"]),
            Some(&json!("student_new"))
        );
        // Sibling untouched
        assert_eq!(
            user.field_at_path(&["Student", "School"]),
            Some(&json!("MIT"))
        );
    }

    #[test]
    fn test_replacing_whole_container_clears_siblings() {
        // Setting the "Student" field itself swaps in the new object wholesale.
        let db = database();
        let mut user = seed_user(&db, "user1", "Alice");
        let updater = CascadeUpdater::new(db.clone());

        updater
            .update(
                &mut user,
                &[],
                "Student",
                json!({ "StudentId": "student_new", "School": null }),
            )
            .unwrap();

        assert_eq!(user.field_at_path(&["Student", "School"]), Some(&json!(null)));
        assert_eq!(
            user.field_at_path(&["Student", "StudentId"]),
            Some(&json!("student_new"))
        );
    }

    #[test]
    fn test_update_persists_root() {
        let db = database();
        let mut user = seed_user(&db, "user1", "Alice");
        let updater = CascadeUpdater::new(db.clone());

        updater
            .update(&mut user, &[], "Name", json!("Alicia"))
            .unwrap();

        let stored = db
            .collection("users")
            .unwrap()
            .get_by_id("user1")
            .unwrap();
        assert_eq!(stored.field("Name"), Some(&json!("Alicia")));
    }

    #[test]
    fn test_cascade_rewrites_dependent_copies() {
        let db = database();
        let mut user = seed_user(&db, "user1", "Alice");
        seed_question(&db, "q1", "user1", &user);
        seed_question(&db, "q2", "user1", &user);
        let other = seed_user(&db, "user2", "Bob");
        seed_question(&db, "q3", "user2", &other);

        let updater = CascadeUpdater::new(db.clone());
        updater
            .update(&mut user, &[], "Name", json!("Alicia"))
            .unwrap();

        let questions = db.collection("questions").unwrap();
        for id in ["q1", "q2"] {
            let copy = questions.get_by_id(id).unwrap();
            assert_eq!(
                copy.field_at_path(&["UserDocument", "Name"]),
                Some(&json!("Alicia")),
                "embedded copy in {id} not rewritten"
            );
        }
        // Unrelated reference untouched
        assert_eq!(
            questions
                .get_by_id("q3")
                .unwrap()
                .field_at_path(&["UserDocument", "Name"]),
            Some(&json!("Bob"))
        );
    }

    #[test]
    fn test_cascade_is_single_hop() {
        let db = database();
        let mut user = seed_user(&db, "user1", "Alice");
        seed_question(&db, "q1", "user1", &user);

        // A comment embedding the question's current state (second hop)
        let question_body = db
            .collection("questions")
            .unwrap()
            .get_by_id("q1")
            .unwrap();
        let comment = Document::new(
            "comment",
            json!({
                "CommentId": "c1",
                "QuestionId": "q1",
                "QuestionDocument": question_body.body().clone()
            }),
        )
        .unwrap();
        db.collection_of(&TypeName::from("comment"))
            .unwrap()
            .save("c1", comment);

        let updater = CascadeUpdater::new(db.clone());
        updater
            .update(&mut user, &[], "Name", json!("Alicia"))
            .unwrap();

        // The question's copy moved, the comment's copy of the question did not.
        let comment = db.collection("comments").unwrap().get_by_id("c1").unwrap();
        assert_eq!(
            comment.field_at_path(&["QuestionDocument", "UserDocument", "Name"]),
            Some(&json!("Alice"))
        );
    }

    #[test]
    fn test_missing_intermediate_is_created() {
        let db = database();
        let mut user = Document::new("user", json!({ "UserId": "user1" })).unwrap();
        db.collection_of(&TypeName::from("user"))
            .unwrap()
            .save("user1", user.clone());

        let updater = CascadeUpdater::new(db.clone());
        updater
            .update(&mut user, &["Student"], "StudentId", json!("student1"))
            .unwrap();

        assert_eq!(
            user.field_at_path(&["Student", "StudentId"]),
            Some(&json!("student1"))
        );
    }

    #[test]
    fn test_unregistered_root_type_is_reference_resolution_error() {
        let db = database();
        let mut stray = Document::new("stray", json!({ "Id": "s1" })).unwrap();
        let updater = CascadeUpdater::new(db.clone());

        // Identity resolution fails before store lookup for unknown types
        let err = updater
            .update(&mut stray, &[], "Field", json!(1))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownType(_)));
    }
}
