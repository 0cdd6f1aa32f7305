//! Pre-defined gifting scenarios
//!
//! Narrated end-to-end runs over a shared in-memory register, used both as
//! demos and as coarse integration checks.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::time::timeout;
use tracing::info;

use giftwire_core::{GiftItem, GiftTrait, InMemoryRegisterStore, PlayerRef};
use giftwire_mailbox::MailboxConfig;
use giftwire_match::TraitIndex;
use giftwire_service::GiftService;

/// How long a scenario waits for one delivery before giving up
const DELIVERY_WAIT: Duration = Duration::from_secs(2);

/// Outcome of the exchange scenario
#[derive(Debug)]
pub struct ExchangeSummary {
    pub delivered: usize,
    pub refunded: usize,
}

/// Outcome of the concurrent-send scenario
#[derive(Debug)]
pub struct ConcurrentSummary {
    pub expected: usize,
    pub landed: usize,
}

/// Outcome of the trait-matching scenario
#[derive(Debug)]
pub struct MatchingSummary {
    pub players: usize,
    pub matched_queries: usize,
}

/// Run the two-player exchange story:
///
/// ```text
/// Bob opens a box that wants healing gifts
/// Alice asks whether Bob would take her potion: yes, Heal matches
/// Bob starts listening; Alice sends the potion; Bob sees it arrive
/// Bob takes the potion out of the box
/// Bob reopens taking anything; Alice sends a sword
/// Bob does not want the sword and refunds it
/// The sword is back in Alice's box, flagged as a refund
/// ```
pub async fn run_exchange_scenario() -> Result<ExchangeSummary> {
    info!("=== Running Gift Exchange Scenario ===");

    let store = Arc::new(InMemoryRegisterStore::new());
    let alice = GiftService::new(store.clone(), PlayerRef::new(1, 1));
    let bob = GiftService::new(store.clone(), PlayerRef::new(2, 1));

    println!("\n--- Step 1: Bob opens a box for healing gifts ---");
    bob.open_gift_box(false, vec![GiftTrait::named("Heal")])
        .await?;

    println!("\n--- Step 2: Alice checks whether Bob would take a potion ---");
    let potion = GiftItem::new("Potion", vec![GiftTrait::new("Heal", 2.0, 1.0)], 50);
    let verdict = alice
        .can_gift_to(bob.identity(), &potion.trait_names())
        .await?;
    println!("  Verdict: {verdict:?}");

    println!("\n--- Step 3: Bob listens, Alice sends the potion ---");
    let mut arrivals = bob.received_gifts();
    bob.start_listening().await?;
    alice.send_gift(potion, 1, bob.identity()).await?;

    let received = timeout(DELIVERY_WAIT, arrivals.recv()).await??;
    println!(
        "  Bob received {} x{} from {}",
        received.item.name,
        received.amount,
        received.sender()
    );
    let delivered = 1;

    println!("\n--- Step 4: Bob takes the potion out of the box ---");
    bob.remove_gift(&received).await?;

    println!("\n--- Step 5: Bob reopens taking anything; Alice sends a sword ---");
    bob.open_gift_box(true, vec![]).await?;
    let sword = GiftItem::new("Sword", vec![GiftTrait::named("Weapon")], 120);
    alice.send_gift(sword, 1, bob.identity()).await?;
    let unwanted = timeout(DELIVERY_WAIT, arrivals.recv()).await??;

    println!("\n--- Step 6: Bob refunds the sword ---");
    bob.refund_gift(&unwanted).await?;

    let returned = alice.gift_box_contents().await?;
    let refunded = returned.iter().filter(|gift| gift.is_refund).count();
    println!("  Alice's box now holds {refunded} refunded gift(s)");

    bob.close().await?;

    println!("\n=== Exchange complete: {delivered} delivered, {refunded} refunded ===");
    Ok(ExchangeSummary {
        delivered,
        refunded,
    })
}

/// Many senders hammer one box at once
///
/// Every sender drives its own service against the same register key, so
/// conditional writes collide and the retry loop has to absorb the losses.
/// A correct run lands every gift.
pub async fn run_concurrent_scenario(
    senders: usize,
    gifts_per_sender: usize,
) -> Result<ConcurrentSummary> {
    info!(senders, gifts_per_sender, "=== Running Concurrent Send Scenario ===");

    // Contention burns through attempts fast, so give the senders headroom
    let config = MailboxConfig::default()
        .with_max_write_attempts(32)
        .with_retry_base_delay(Duration::from_millis(1));

    let store = Arc::new(InMemoryRegisterStore::new());
    let recipient = PlayerRef::new(0, 1);
    let recipient_service = GiftService::new(store.clone(), recipient);
    recipient_service.open_gift_box(true, vec![]).await?;

    println!("\n--- {senders} senders each deliver {gifts_per_sender} gifts to one box ---");

    let mut tasks = Vec::new();
    for sender_slot in 1..=senders as i32 {
        let store = store.clone();
        let config = config.clone();
        tasks.push(tokio::spawn(async move {
            let sender =
                GiftService::with_config(store, PlayerRef::new(sender_slot, 1), config);
            for n in 0..gifts_per_sender {
                let coin = GiftItem::new(
                    format!("Coin {n} from {sender_slot}"),
                    vec![GiftTrait::named("Currency")],
                    1,
                );
                sender.send_gift(coin, 1, recipient).await?;
            }
            anyhow::Ok(())
        }));
    }
    for task in tasks {
        task.await??;
    }

    let landed = recipient_service.gift_box_contents().await?.len();
    let expected = senders * gifts_per_sender;
    println!("\n=== {landed} of {expected} gifts landed ===");

    Ok(ConcurrentSummary { expected, landed })
}

/// Match sample gifts against registered trait wishes
///
/// Builds a small registry of players and the traits they hope to receive,
/// then looks up the closest recipients for a few items.
pub fn run_matching_scenario() -> MatchingSummary {
    info!("=== Running Trait Matching Scenario ===");

    let wishes: Vec<(i32, Vec<GiftTrait>)> = vec![
        (1, vec![GiftTrait::new("Heal", 1.0, 1.0)]),
        (
            2,
            vec![
                GiftTrait::new("Heal", 2.0, 1.0),
                GiftTrait::new("Speed", 1.0, 1.0),
            ],
        ),
        (3, vec![GiftTrait::new("Armor", 1.0, 1.0)]),
        (4, vec![GiftTrait::new("Heal", 1.0, 1.0)]),
    ];

    println!("\n--- Registered wishes ---");
    let mut index: TraitIndex<PlayerRef> = TraitIndex::new();
    for (slot, traits) in &wishes {
        let names: Vec<&str> = traits.iter().map(|t| t.name.as_str()).collect();
        println!("  Player {slot} wants {names:?}");
        index.register(PlayerRef::new(*slot, 1), traits);
    }

    let queries = vec![
        GiftItem::new("Potion", vec![GiftTrait::new("Heal", 1.0, 1.0)], 50),
        GiftItem::new("Elixir", vec![GiftTrait::new("Heal", 2.0, 1.0)], 200),
        GiftItem::new("Sword", vec![GiftTrait::new("Weapon", 1.0, 1.0)], 120),
    ];

    println!("\n--- Lookups ---");
    let mut matched_queries = 0;
    for item in &queries {
        let closest = index.find_closest(&item.traits);
        if closest.is_empty() {
            println!("  {}: no player wants these traits", item.name);
        } else {
            matched_queries += 1;
            let mut hits: Vec<String> = closest.iter().map(|p| p.to_string()).collect();
            hits.sort();
            println!("  {}: best recipients {}", item.name, hits.join(", "));
        }
    }

    MatchingSummary {
        players: wishes.len(),
        matched_queries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_exchange_scenario_completes() {
        let summary = run_exchange_scenario().await.unwrap();

        assert_eq!(summary.delivered, 1);
        assert_eq!(summary.refunded, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_scenario_loses_nothing() {
        let summary = run_concurrent_scenario(4, 3).await.unwrap();

        assert_eq!(summary.landed, summary.expected);
    }

    #[test]
    fn test_matching_scenario_matches_heal_queries() {
        let summary = run_matching_scenario();

        assert_eq!(summary.players, 4);
        assert_eq!(summary.matched_queries, 2);
    }
}
