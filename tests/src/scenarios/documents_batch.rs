//! # Documents Batch Scenarios
//!
//! Duplicate detection inside a batch and against the store, revision
//! checks, id binding and the two application modes.

#[cfg(test)]
mod tests {
    use crate::init_tracing;
    use dpp_core::domain::{DocumentCreateTransition, DocumentReplaceTransition, DocumentTransition};
    use dpp_core::test_fixtures::{
        identity, note_contract, platform, FixtureIdentity, Platform, FIXTURE_OWNER,
    };
    use dpp_core::{
        apply_to_documents, ApplyError, ConsensusError, DataContract, Document,
        DocumentsBatchTransition, DocumentsByAction, PlatformConfig, StateTransition,
        StateTransitionApplier, StateTransitionLike,
    };
    use proptest::prelude::*;
    use serde_json::{json, Map, Value};
    use shared_types::Identifier;
    use std::collections::HashMap;
    use std::sync::Arc;

    // =========================================================================
    // FIXTURES
    // =========================================================================

    struct Scene {
        platform: Platform,
        contract: DataContract,
        owner: FixtureIdentity,
    }

    fn scene() -> Scene {
        init_tracing();
        let platform = platform(PlatformConfig::default());
        let contract = note_contract(FIXTURE_OWNER);
        let owner = identity(FIXTURE_OWNER);
        platform.repository.insert_data_contract(contract.clone());
        platform.repository.insert_identity(owner.identity.clone());
        Scene {
            platform,
            contract,
            owner,
        }
    }

    fn note(title: &str) -> Map<String, Value> {
        json!({ "title": title }).as_object().cloned().unwrap_or_default()
    }

    impl Scene {
        fn document(&self, title: &str) -> Document {
            self.platform
                .documents
                .create(&self.contract, FIXTURE_OWNER, "note", note(title))
                .unwrap()
        }

        fn signed(&self, mut batch: DocumentsBatchTransition) -> DocumentsBatchTransition {
            batch.sign(&self.owner.public_key, &self.owner.key_pair).unwrap();
            batch
        }

        fn batch(&self, documents: DocumentsByAction) -> DocumentsBatchTransition {
            let batch = self.platform.documents.create_state_transition(documents).unwrap();
            self.signed(batch)
        }
    }

    // =========================================================================
    // DUPLICATES
    // =========================================================================

    #[tokio::test]
    async fn test_unique_index_collision_inside_batch() {
        let scene = scene();
        let first = scene.document("same");
        let second = scene.document("same");
        let batch = scene.batch(DocumentsByAction {
            create: vec![first.clone(), second.clone()],
            ..DocumentsByAction::default()
        });

        let result = scene
            .platform
            .validator
            .validate_structure(&batch.to_object(false))
            .await
            .unwrap();

        let [ConsensusError::DuplicateDocumentTransitions { references }] = result.errors() else {
            panic!("unexpected errors: {:?}", result.errors());
        };
        assert_eq!(references.len(), 2);
        for document in [&first, &second] {
            assert!(references.contains(&("note".to_string(), document.id().to_hex())));
        }
    }

    #[tokio::test]
    async fn test_unique_index_collision_with_stored_document() {
        let scene = scene();
        scene.platform.repository.insert_document(scene.document("taken"));
        let batch = scene.batch(DocumentsByAction {
            create: vec![scene.document("taken")],
            ..DocumentsByAction::default()
        });

        let structure = scene
            .platform
            .validator
            .validate_structure(&batch.to_object(false))
            .await
            .unwrap();
        assert!(structure.is_valid(), "{:?}", structure.errors());

        let data = scene
            .platform
            .validator
            .validate_data(&StateTransition::from(batch))
            .await
            .unwrap();
        assert!(matches!(
            data.errors(),
            [ConsensusError::DuplicateDocument { document_type, .. }] if document_type == "note"
        ));
    }

    #[tokio::test]
    async fn test_other_owner_may_reuse_title() {
        let scene = scene();
        let stranger = Identifier::new([0x33; 32]);
        let foreign = scene
            .platform
            .documents
            .create(&scene.contract, stranger, "note", note("shared"))
            .unwrap();
        scene.platform.repository.insert_document(foreign);

        let batch = scene.batch(DocumentsByAction {
            create: vec![scene.document("shared")],
            ..DocumentsByAction::default()
        });
        let result = scene
            .platform
            .validator
            .validate_data(&StateTransition::from(batch))
            .await
            .unwrap();
        assert!(result.is_valid(), "{:?}", result.errors());
    }

    // =========================================================================
    // REVISIONS
    // =========================================================================

    #[tokio::test]
    async fn test_replace_must_advance_revision_by_one() {
        let scene = scene();
        let stored = scene.document("draft");
        scene.platform.repository.insert_document(stored.clone());

        let mut replace = DocumentReplaceTransition::from_document(&stored);
        replace.revision = 3;
        let batch = scene.signed(DocumentsBatchTransition::new(
            0,
            FIXTURE_OWNER,
            vec![DocumentTransition::Replace(replace)],
        ));

        let result = scene
            .platform
            .validator
            .validate(&batch.to_object(false))
            .await
            .unwrap();
        assert_eq!(
            result.errors(),
            &[ConsensusError::InvalidDocumentRevision {
                document_id: stored.id(),
                current_revision: 1,
                declared_revision: 3,
            }]
        );
    }

    #[tokio::test]
    async fn test_factory_replace_passes_state_checks() {
        let scene = scene();
        let mut stored = scene.document("draft");
        scene.platform.repository.insert_document(stored.clone());

        stored.set_data(note("final"));
        let batch = scene.batch(DocumentsByAction {
            replace: vec![stored],
            ..DocumentsByAction::default()
        });

        let result = scene
            .platform
            .validator
            .validate(&batch.to_object(false))
            .await
            .unwrap();
        assert!(result.is_valid(), "{:?}", result.errors());
    }

    // =========================================================================
    // APPLICATION MODES
    // =========================================================================

    #[tokio::test]
    async fn test_snapshot_and_live_application_differ() {
        let scene = scene();
        let document = scene.document("draft");
        let mut replacement = document.clone();
        replacement.set_data(note("final"));

        let batch = DocumentsBatchTransition::new(
            0,
            FIXTURE_OWNER,
            vec![
                DocumentTransition::Create(DocumentCreateTransition::from_document(&document).unwrap()),
                DocumentTransition::Replace(DocumentReplaceTransition::from_document(&replacement)),
            ],
        );

        assert_eq!(
            apply_to_documents(&batch, &HashMap::new()).map(|results| results.len()),
            Err(ApplyError::DocumentNotProvided {
                document_id: document.id(),
            })
        );

        let applier = StateTransitionApplier::new(Arc::clone(&scene.platform.repository));
        applier.apply_documents_batch_transition(&batch).await.unwrap();
        let stored = scene
            .platform
            .repository
            .get_document(&scene.contract.id(), "note", &document.id())
            .unwrap();
        assert_eq!(stored.revision(), 2);
        assert_eq!(stored.get("title"), Some(json!("final")));
    }

    // =========================================================================
    // ID BINDING
    // =========================================================================

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_forged_create_id_is_rejected(forged in any::<[u8; 32]>()) {
            let runtime = tokio::runtime::Runtime::new().unwrap();
            let scene = scene();
            let document = scene.document("bound");
            prop_assume!(Identifier::new(forged) != document.id());

            let batch = scene.batch(DocumentsByAction {
                create: vec![document.clone()],
                ..DocumentsByAction::default()
            });
            let mut raw = batch.to_object(false);
            raw["transitions"][0]["$id"] = json!(Identifier::new(forged).to_hex());

            let result = runtime
                .block_on(scene.platform.validator.validate_structure(&raw))
                .unwrap();
            let rejected = result.errors().iter().any(|error| matches!(
                error,
                ConsensusError::InvalidDocumentTransitionId { expected_id, .. } if *expected_id == document.id()
            ));
            prop_assert!(rejected, "{:?}", result.errors());
        }
    }
}
