//! Game matchmaking zome.
//!
//! Agents advertise that they want to play by creating a proposal; another
//! agent accepts a proposal, which starts a game session between the two.
//!
//! Storage layout:
//! - `anchor("game_proposals") --has_proposal--> game_proposal`
//! - `game_proposal --from_proposal--> game_session`

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use zome_state::{load_linked, Address, Entry, EntryStore, Link, LinkMatch};

use crate::application::{CallContext, Zome};
use crate::error::ZomeError;

/// Registry kind for this zome.
pub const KIND: &str = "matchmaking";

const PROPOSAL_ENTRY: &str = "game_proposal";
const GAME_ENTRY: &str = "game_session";
const ANCHOR_ENTRY: &str = "anchor";
const PROPOSALS_ANCHOR: &str = "game_proposals";
const HAS_PROPOSAL: &str = "has_proposal";
const FROM_PROPOSAL: &str = "from_proposal";

/// An agent advertising that they wish to play a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameProposal {
    pub agent: Address,
    pub message: String,
    pub timestamp: u32,
}

/// A game started by accepting a proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSession {
    /// The accepting agent.
    pub player_1: Address,
    /// The proposing agent.
    pub player_2: Address,
    pub created_at: u32,
}

#[derive(Debug, Deserialize)]
struct CreateProposalInput {
    message: String,
    #[serde(default)]
    timestamp: u32,
}

#[derive(Debug, Deserialize)]
struct AcceptProposalInput {
    proposal: GameProposal,
    created_at: u32,
}

#[derive(Debug, Deserialize)]
struct CheckResponsesInput {
    proposal_addr: Address,
}

pub fn factory() -> Arc<dyn Zome> {
    Arc::new(MatchmakingZome)
}

/// See the module docs.
#[derive(Debug, Default)]
pub struct MatchmakingZome;

impl MatchmakingZome {
    async fn create_proposal(
        &self,
        ctx: &CallContext,
        input: CreateProposalInput,
    ) -> Result<Address, ZomeError> {
        let proposal = GameProposal {
            agent: ctx.agent.clone(),
            message: input.message,
            timestamp: input.timestamp,
        };
        validate_proposal(&proposal)?;

        let store = ctx.store.as_ref();
        let proposal_address = store
            .commit_entry(&Entry::app(PROPOSAL_ENTRY, &proposal)?)
            .await?;
        let anchor_address = proposals_anchor(store).await?;
        store
            .link_entries(Link::new(&anchor_address, &proposal_address, HAS_PROPOSAL, ""))
            .await?;

        tracing::debug!(proposal = %proposal_address.short(), agent = %ctx.agent.short(), "Proposal created");
        Ok(proposal_address)
    }

    async fn get_proposals(&self, ctx: &CallContext) -> Result<Vec<GameProposal>, ZomeError> {
        let store = ctx.store.as_ref();
        let anchor_address = Entry::app(ANCHOR_ENTRY, &PROPOSALS_ANCHOR)?.address()?;
        Ok(load_linked(store, &anchor_address, HAS_PROPOSAL, LinkMatch::Any).await?)
    }

    async fn accept_proposal(
        &self,
        ctx: &CallContext,
        input: AcceptProposalInput,
    ) -> Result<Address, ZomeError> {
        let store = ctx.store.as_ref();
        let proposal_address = Entry::app(PROPOSAL_ENTRY, &input.proposal)?.address()?;
        if !store.contains(&proposal_address).await? {
            return Err(ZomeError::NotFound(format!(
                "proposal {} has not been created",
                proposal_address
            )));
        }

        let game = GameSession {
            player_1: ctx.agent.clone(),
            player_2: input.proposal.agent.clone(),
            created_at: input.created_at,
        };
        validate_game(&game)?;

        let game_address = store.commit_entry(&Entry::app(GAME_ENTRY, &game)?).await?;
        store
            .link_entries(Link::new(&proposal_address, &game_address, FROM_PROPOSAL, ""))
            .await?;

        tracing::debug!(proposal = %proposal_address.short(), game = %game_address.short(), "Proposal accepted");
        Ok(game_address)
    }

    async fn check_responses(
        &self,
        ctx: &CallContext,
        input: CheckResponsesInput,
    ) -> Result<Vec<GameSession>, ZomeError> {
        Ok(load_linked(
            ctx.store.as_ref(),
            &input.proposal_addr,
            FROM_PROPOSAL,
            LinkMatch::Any,
        )
        .await?)
    }
}

#[async_trait]
impl Zome for MatchmakingZome {
    fn functions(&self) -> &[&'static str] {
        &[
            "create_proposal",
            "get_proposals",
            "accept_proposal",
            "check_responses",
        ]
    }

    async fn call(
        &self,
        ctx: &CallContext,
        function: &str,
        input: Value,
    ) -> Result<Value, ZomeError> {
        match function {
            "create_proposal" => to_output(self.create_proposal(ctx, decode(input)?).await?),
            "get_proposals" => to_output(self.get_proposals(ctx).await?),
            "accept_proposal" => to_output(self.accept_proposal(ctx, decode(input)?).await?),
            "check_responses" => to_output(self.check_responses(ctx, decode(input)?).await?),
            other => Err(ZomeError::UnknownOperation {
                capability: KIND.to_string(),
                function: other.to_string(),
            }),
        }
    }
}

fn validate_proposal(proposal: &GameProposal) -> Result<(), ZomeError> {
    if proposal.message.trim().is_empty() {
        return Err(ZomeError::ValidationFailed(
            "Proposal message must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Player 1 is always the caller, so this only rules out self-play.
fn validate_game(game: &GameSession) -> Result<(), ZomeError> {
    if game.player_1 == game.player_2 {
        return Err(ZomeError::ValidationFailed(
            "Cannot accept your own proposal".to_string(),
        ));
    }
    Ok(())
}

async fn proposals_anchor(store: &dyn EntryStore) -> Result<Address, ZomeError> {
    Ok(store
        .commit_entry(&Entry::app(ANCHOR_ENTRY, &PROPOSALS_ANCHOR)?)
        .await?)
}

fn decode<T: DeserializeOwned>(input: Value) -> Result<T, ZomeError> {
    serde_json::from_value(input).map_err(|e| ZomeError::InvalidInput(e.to_string()))
}

fn to_output<T: Serialize>(output: T) -> Result<Value, ZomeError> {
    serde_json::to_value(output).map_err(|e| ZomeError::Internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use zome_state::MemoryEntryStore;

    fn ctx(store: &Arc<MemoryEntryStore>, name: &str) -> CallContext {
        CallContext {
            agent: Address::for_content(format!("agent:{}", name).as_bytes()),
            store: store.clone(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get_proposal() {
        let store = Arc::new(MemoryEntryStore::new());
        let alice = ctx(&store, "alice");
        let zome = MatchmakingZome;

        let address = zome
            .call(&alice, "create_proposal", json!({ "message": "sup" }))
            .await
            .unwrap();
        assert_eq!(address.as_str().unwrap().len(), zome_state::ADDRESS_LEN);

        let proposals = zome
            .call(&alice, "get_proposals", json!({}))
            .await
            .unwrap();
        assert_eq!(
            proposals,
            json!([{ "agent": alice.agent, "message": "sup", "timestamp": 0 }])
        );
    }

    #[tokio::test]
    async fn test_get_proposals_empty_before_any_create() {
        let store = Arc::new(MemoryEntryStore::new());
        let zome = MatchmakingZome;
        let proposals = zome
            .call(&ctx(&store, "alice"), "get_proposals", json!({}))
            .await
            .unwrap();
        assert_eq!(proposals, json!([]));
    }

    #[tokio::test]
    async fn test_create_rejects_empty_message() {
        let store = Arc::new(MemoryEntryStore::new());
        let err = MatchmakingZome
            .call(&ctx(&store, "alice"), "create_proposal", json!({ "message": "  " }))
            .await
            .unwrap_err();
        assert!(matches!(err, ZomeError::ValidationFailed(_)));
    }

    #[tokio::test]
    async fn test_create_rejects_missing_message() {
        let store = Arc::new(MemoryEntryStore::new());
        let err = MatchmakingZome
            .call(&ctx(&store, "alice"), "create_proposal", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ZomeError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_accept_and_check_responses() {
        let store = Arc::new(MemoryEntryStore::new());
        let alice = ctx(&store, "alice");
        let bob = ctx(&store, "bob");
        let zome = MatchmakingZome;

        let proposal_addr = zome
            .call(&alice, "create_proposal", json!({ "message": "chess?" }))
            .await
            .unwrap();
        let proposal = zome.call(&bob, "get_proposals", json!({})).await.unwrap()[0].clone();

        let game_addr = zome
            .call(
                &bob,
                "accept_proposal",
                json!({ "proposal": proposal, "created_at": 7 }),
            )
            .await
            .unwrap();
        assert!(game_addr.is_string());

        let games = zome
            .call(
                &alice,
                "check_responses",
                json!({ "proposal_addr": proposal_addr }),
            )
            .await
            .unwrap();
        assert_eq!(
            games,
            json!([{ "player_1": bob.agent, "player_2": alice.agent, "created_at": 7 }])
        );
    }

    #[tokio::test]
    async fn test_accept_own_proposal_rejected() {
        let store = Arc::new(MemoryEntryStore::new());
        let alice = ctx(&store, "alice");
        let zome = MatchmakingZome;

        zome.call(&alice, "create_proposal", json!({ "message": "sup" }))
            .await
            .unwrap();
        let proposal = zome.call(&alice, "get_proposals", json!({})).await.unwrap()[0].clone();

        let err = zome
            .call(
                &alice,
                "accept_proposal",
                json!({ "proposal": proposal, "created_at": 0 }),
            )
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ZomeError::ValidationFailed("Cannot accept your own proposal".to_string())
        );
    }

    #[tokio::test]
    async fn test_accept_unknown_proposal_not_found() {
        let store = Arc::new(MemoryEntryStore::new());
        let bob = ctx(&store, "bob");
        let forged = GameProposal {
            agent: Address::for_content(b"agent:alice"),
            message: "never created".to_string(),
            timestamp: 0,
        };

        let err = MatchmakingZome
            .call(
                &bob,
                "accept_proposal",
                json!({ "proposal": forged, "created_at": 0 }),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ZomeError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_accept_with_rewritten_author_not_found() {
        let store = Arc::new(MemoryEntryStore::new());
        let alice = ctx(&store, "alice");
        let bob = ctx(&store, "bob");
        let zome = MatchmakingZome;

        zome.call(&alice, "create_proposal", json!({ "message": "sup" }))
            .await
            .unwrap();
        let mut proposal = zome.call(&bob, "get_proposals", json!({})).await.unwrap()[0].clone();
        proposal["agent"] = json!(bob.agent);

        let err = zome
            .call(
                &bob,
                "accept_proposal",
                json!({ "proposal": proposal, "created_at": 0 }),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ZomeError::NotFound(_)));
        assert_eq!(store.entry_count(), 2);
    }

    #[tokio::test]
    async fn test_check_responses_rejects_malformed_address() {
        let store = Arc::new(MemoryEntryStore::new());
        let err = MatchmakingZome
            .call(
                &ctx(&store, "alice"),
                "check_responses",
                json!({ "proposal_addr": "not-an-address" }),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ZomeError::InvalidInput(_)));
    }
}
