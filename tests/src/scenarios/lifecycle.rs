//! # Lifecycle Scenario
//!
//! One identity registers a contract, then creates, replaces and deletes a
//! document, each step going through the wire form, both validation passes
//! and the applier.

#[cfg(test)]
mod tests {
    use crate::init_tracing;
    use anyhow::{ensure, Context, Result};
    use dpp_core::test_fixtures::{identity, note_documents, platform, Platform, FIXTURE_NOW, FIXTURE_OWNER};
    use dpp_core::{
        DataContract, DocumentsBatchTransition, DocumentsByAction, InMemoryStateRepository,
        PlatformConfig, StateRepository, StateTransition, StateTransitionApplier,
        StateTransitionLike,
    };
    use serde_json::json;
    use shared_crypto::Secp256k1KeyPair;
    use std::sync::Arc;

    // =========================================================================
    // HELPERS
    // =========================================================================

    /// Validates `transition` from its canonical bytes and applies it.
    async fn submit(
        platform: &Platform,
        applier: &StateTransitionApplier<InMemoryStateRepository>,
        bytes: &[u8],
    ) -> Result<StateTransition> {
        let transition = platform.state_transitions.create_from_buffer(bytes, false).await?;
        let result = platform.validator.validate_data(&transition).await?;
        ensure!(result.is_valid(), "data validation failed: {:?}", result.errors());
        applier.apply_state_transition(&transition).await?;
        Ok(transition)
    }

    fn signed_batch(
        platform: &Platform,
        documents: DocumentsByAction,
        public_key: &dpp_core::IdentityPublicKey,
        key_pair: &Secp256k1KeyPair,
    ) -> Result<DocumentsBatchTransition> {
        let mut batch = platform.documents.create_state_transition(documents)?;
        batch.sign(public_key, key_pair)?;
        Ok(batch)
    }

    // =========================================================================
    // SCENARIO
    // =========================================================================

    #[tokio::test]
    async fn test_contract_and_document_lifecycle() -> Result<()> {
        init_tracing();
        let platform = platform(PlatformConfig::default());
        let applier = StateTransitionApplier::new(Arc::clone(&platform.repository));
        let owner = identity(FIXTURE_OWNER);
        platform.repository.insert_identity(owner.identity.clone());

        // Register the contract.
        let contract = platform.data_contracts.create(FIXTURE_OWNER, note_documents())?;
        let mut registration = platform
            .data_contracts
            .create_data_contract_create_transition(contract.clone())?;
        registration.sign(&owner.public_key, &owner.key_pair)?;
        ensure!(registration.calculate_fee()? > 0);

        let result = platform.validator.validate(&registration.to_object(false)).await?;
        ensure!(result.is_valid(), "registration rejected: {:?}", result.errors());
        submit(&platform, &applier, &registration.to_buffer(false)?).await?;

        let stored: Arc<DataContract> = platform
            .repository
            .fetch_data_contract(&contract.id())
            .await?
            .context("contract not stored")?;
        assert_eq!(stored.to_buffer()?, contract.to_buffer()?);

        // A second registration of the same contract is rejected.
        let result = platform.validator.validate_data(&StateTransition::from(registration)).await?;
        ensure!(!result.is_valid());

        // Create.
        let document = platform.documents.create(
            &contract,
            FIXTURE_OWNER,
            "note",
            json!({ "title": "hello", "body": "first" })
                .as_object()
                .cloned()
                .context("note data")?,
        )?;
        let restored = platform
            .documents
            .create_from_buffer(&document.to_buffer()?, false)
            .await?;
        assert_eq!(restored.id(), document.id());

        let batch = signed_batch(
            &platform,
            DocumentsByAction {
                create: vec![document.clone()],
                ..DocumentsByAction::default()
            },
            &owner.public_key,
            &owner.key_pair,
        )?;
        submit(&platform, &applier, &batch.to_buffer(false)?).await?;
        assert_eq!(platform.repository.document_count(), 1);

        // Replace.
        let mut current = platform
            .repository
            .get_document(&contract.id(), "note", &document.id())
            .context("document not stored")?;
        assert_eq!(current.revision(), 1);
        current.set("body", json!("second"))?;
        current.set_updated_at(Some(FIXTURE_NOW + 1));

        let batch = signed_batch(
            &platform,
            DocumentsByAction {
                replace: vec![current],
                ..DocumentsByAction::default()
            },
            &owner.public_key,
            &owner.key_pair,
        )?;
        submit(&platform, &applier, &batch.to_buffer(false)?).await?;

        let current = platform
            .repository
            .get_document(&contract.id(), "note", &document.id())
            .context("document not stored")?;
        assert_eq!(current.revision(), 2);
        assert_eq!(current.get("body"), Some(json!("second")));
        assert_eq!(current.updated_at(), Some(FIXTURE_NOW + 1));

        // Replaying the same replace is now one revision behind.
        let replay = platform.validator.validate(&batch.to_object(false)).await?;
        ensure!(!replay.is_valid());

        // Delete.
        let batch = signed_batch(
            &platform,
            DocumentsByAction {
                delete: vec![current],
                ..DocumentsByAction::default()
            },
            &owner.public_key,
            &owner.key_pair,
        )?;
        submit(&platform, &applier, &batch.to_buffer(false)?).await?;
        assert_eq!(platform.repository.document_count(), 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_foreign_signer_cannot_touch_documents() -> Result<()> {
        init_tracing();
        let platform = platform(PlatformConfig::default());
        let owner = identity(FIXTURE_OWNER);
        platform.repository.insert_identity(owner.identity.clone());

        let contract = platform.data_contracts.create(FIXTURE_OWNER, note_documents())?;
        platform.repository.insert_data_contract(contract.clone());
        let document = platform.documents.create(
            &contract,
            FIXTURE_OWNER,
            "note",
            json!({ "title": "mine" }).as_object().cloned().context("note data")?,
        )?;

        let mut batch = platform.documents.create_state_transition(DocumentsByAction {
            create: vec![document],
            ..DocumentsByAction::default()
        })?;
        let intruder = Secp256k1KeyPair::generate();
        batch.sign(
            &dpp_core::IdentityPublicKey::from_key_pair(0, &intruder),
            &intruder,
        )?;

        let outcome = platform
            .state_transitions
            .create_from_buffer(&batch.to_buffer(false)?, false)
            .await;
        ensure!(
            matches!(
                outcome,
                Err(dpp_core::DppError::InvalidStateTransition { ref errors, .. })
                    if errors == &[dpp_core::ConsensusError::InvalidStateTransitionSignature]
            ),
            "unexpected outcome: {outcome:?}"
        );
        Ok(())
    }
}
