//! Matchmaking suite.
//!
//! Expects agents named `alice` and `bob` and a package exposing the
//! matchmaking zome under the `main` capability. Cases assume a fresh
//! instance each, i.e. `isolation = "per_case"`.

use serde_json::json;

use crate::agent::Agents;
use crate::scenario::Scenario;
use crate::tape::Tape;
use crate::zomes::matchmaking::{GameProposal, GameSession};

pub const NAME: &str = "matchmaking";
pub const DESCRIPTION: &str = "proposal creation, cross-agent visibility and acceptance";

const CAPABILITY: &str = "main";

pub fn register_cases(scenario: &mut Scenario) {
    scenario
        .register_case("alice can create a proposal and retrieve it", create_and_retrieve)
        .register_case("bob can see alice's proposal", cross_agent_visibility)
        .register_case(
            "bob can accept alice's proposal and alice sees the game",
            accept_and_check_responses,
        )
        .register_case("reading proposals twice gives the same list", read_idempotence)
        .register_case("proposals are listed in creation order", creation_order);
}

async fn create_and_retrieve(t: Tape, agents: Agents) -> anyhow::Result<()> {
    let alice = agents.agent("alice")?;

    let created = alice
        .call_sync(CAPABILITY, "create_proposal", json!({ "message": "sup" }))
        .await?;
    t.is_ok(&created, "create_proposal succeeds");
    let address = created.ok().and_then(|v| v.as_str()).unwrap_or_default();
    t.equal(&address.len(), &46, "proposal address is 46 characters");

    let listed = alice
        .call_sync(CAPABILITY, "get_proposals", json!({}))
        .await?;
    let proposals: Vec<GameProposal> = listed.decode_ok()?;
    t.equal(&proposals.len(), &1, "alice sees one proposal");
    Ok(())
}

async fn cross_agent_visibility(t: Tape, agents: Agents) -> anyhow::Result<()> {
    let alice = agents.agent("alice")?;
    let bob = agents.agent("bob")?;

    alice
        .call_sync(CAPABILITY, "create_proposal", json!({ "message": "sup" }))
        .await?
        .expect_ok()?;

    let proposals: Vec<GameProposal> = bob
        .call_sync(CAPABILITY, "get_proposals", json!({}))
        .await?
        .decode_ok()?;
    t.equal(&proposals.len(), &1, "bob sees one proposal");
    t.ok(
        proposals
            .iter()
            .any(|p| &p.agent == alice.id() && p.message == "sup"),
        "the proposal is alice's",
    );
    Ok(())
}

async fn accept_and_check_responses(t: Tape, agents: Agents) -> anyhow::Result<()> {
    let alice = agents.agent("alice")?;
    let bob = agents.agent("bob")?;

    let proposal_addr = alice
        .call_sync(CAPABILITY, "create_proposal", json!({ "message": "sup" }))
        .await?
        .expect_ok()?;
    let proposal = GameProposal {
        agent: alice.id().clone(),
        message: "sup".to_string(),
        timestamp: 0,
    };

    let accepted = bob
        .call_sync(
            CAPABILITY,
            "accept_proposal",
            json!({ "proposal": proposal, "created_at": 0 }),
        )
        .await?;
    t.is_ok(&accepted, "bob accepts the proposal");

    let expected = vec![GameSession {
        player_1: bob.id().clone(),
        player_2: alice.id().clone(),
        created_at: 0,
    }];
    for (viewer, who) in [(bob, "bob"), (alice, "alice")] {
        let games: Vec<GameSession> = viewer
            .call_sync(
                CAPABILITY,
                "check_responses",
                json!({ "proposal_addr": proposal_addr }),
            )
            .await?
            .decode_ok()?;
        t.deep_equal(
            &games,
            &expected,
            &format!("{} sees one game, bob against alice", who),
        );
    }
    Ok(())
}

async fn read_idempotence(t: Tape, agents: Agents) -> anyhow::Result<()> {
    let alice = agents.agent("alice")?;
    alice
        .call_sync(CAPABILITY, "create_proposal", json!({ "message": "chess?" }))
        .await?
        .expect_ok()?;

    let first = alice.call_sync(CAPABILITY, "get_proposals", json!({})).await?;
    let second = alice.call_sync(CAPABILITY, "get_proposals", json!({})).await?;
    t.deep_equal(&second, &first, "consecutive reads agree");
    Ok(())
}

async fn creation_order(t: Tape, agents: Agents) -> anyhow::Result<()> {
    let alice = agents.agent("alice")?;
    let bob = agents.agent("bob")?;
    let messages = ["first", "second", "third"];

    for (i, message) in messages.iter().enumerate() {
        let author = if i % 2 == 0 { alice } else { bob };
        author
            .call_sync(
                CAPABILITY,
                "create_proposal",
                json!({ "message": message, "timestamp": i }),
            )
            .await?
            .expect_ok()?;
    }

    let proposals: Vec<GameProposal> = bob
        .call_sync(CAPABILITY, "get_proposals", json!({}))
        .await?
        .decode_ok()?;
    let listed: Vec<&str> = proposals.iter().map(|p| p.message.as_str()).collect();
    t.deep_equal(&listed, &messages, "proposals come back in creation order");
    Ok(())
}
