//! Integration tests for withdraw and borrow tickets.
//!
//! These run full lending episodes against a real `MemoryVault`: assets
//! leave custody only through tickets, in the declared reverse order, and
//! borrowed assets have to come back before a borrow ticket can retire.
//! Every failure case also checks that the ticket and the vault are exactly
//! as they were before the failed call.

use std::sync::Arc;
use std::thread;

use strongroom_protocol::asset::{Asset, AssetId, Custody};
use strongroom_protocol::ticket::{
    create_borrow_ticket, create_withdraw_ticket, BorrowTicket, TicketError, WithdrawTicket,
};
use strongroom_protocol::vault::{IncomingTransfer, MemoryVault, Vault, VaultAddress, VaultError};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

fn id(label: &str) -> AssetId {
    AssetId::from_label(label)
}

fn ids(labels: &[&str]) -> Vec<AssetId> {
    labels.iter().map(|l| id(l)).collect()
}

/// A vault funded with one labelled asset per label.
fn funded_vault(labels: &[&str]) -> MemoryVault {
    let vault = MemoryVault::new("treasury");
    for label in labels {
        vault.deposit(Asset::labelled(label, "nft"));
    }
    vault
}

fn handle(vault: &MemoryVault, label: &str) -> IncomingTransfer {
    IncomingTransfer::new(vault.address(), id(label))
}

// ---------------------------------------------------------------------------
// Withdraw Ticket
// ---------------------------------------------------------------------------

#[test]
fn k_redemptions_remove_the_last_k_in_reverse_order() {
    let labels = ["A", "B", "C", "D", "E"];
    for k in 0..=labels.len() {
        let vault = funded_vault(&labels);
        let mut ticket = create_withdraw_ticket(ids(&labels));

        let mut removed = Vec::new();
        for _ in 0..k {
            let expected = ticket.next_expected().unwrap();
            let asset = ticket
                .redeem_next(&vault, IncomingTransfer::new(vault.address(), expected))
                .unwrap();
            removed.push(asset.id());
        }

        assert_eq!(ticket.remaining(), labels.len() - k);
        let mut last_k: Vec<AssetId> = ids(&labels[labels.len() - k..]);
        last_k.reverse();
        assert_eq!(removed, last_k);
        assert_eq!(vault.len(), labels.len() - k);
    }
}

#[test]
fn mismatch_after_a_successful_redemption_leaves_state_unchanged() {
    let vault = funded_vault(&["A", "B", "C"]);
    let mut ticket = create_withdraw_ticket(ids(&["A", "B", "C"]));

    ticket.redeem_next(&vault, handle(&vault, "C")).unwrap();
    assert_eq!(ticket.pending(), ids(&["A", "B"]).as_slice());

    let err = ticket.redeem_next(&vault, handle(&vault, "A")).unwrap_err();
    assert_eq!(
        err,
        TicketError::MismatchedAsset {
            expected: id("B"),
            actual: id("A"),
        }
    );
    assert_eq!(ticket.pending(), ids(&["A", "B"]).as_slice());
    assert!(vault.holds(id("A")));
    assert!(vault.holds(id("B")));

    // Retrying with the right handle works.
    ticket.redeem_next(&vault, handle(&vault, "B")).unwrap();
    ticket.redeem_next(&vault, handle(&vault, "A")).unwrap();
    assert!(ticket.retire().is_ok());
    assert!(vault.is_empty());
}

#[test]
fn redemption_is_stack_ordered_not_set_membership() {
    // Every identifier is on the ticket, but only the tail may be redeemed.
    let vault = funded_vault(&["A", "B", "C"]);
    let mut ticket = create_withdraw_ticket(ids(&["A", "B", "C"]));
    for wrong in ["A", "B"] {
        assert!(matches!(
            ticket.redeem_next(&vault, handle(&vault, wrong)),
            Err(TicketError::MismatchedAsset { .. })
        ));
    }
    assert_eq!(ticket.remaining(), 3);
    assert_eq!(vault.len(), 3);
}

#[test]
fn retire_fails_for_every_non_empty_pending() {
    for n in 1..=4 {
        let ticket = WithdrawTicket::new((0..n).map(|i| id(&format!("asset-{i}"))));
        let rejected = ticket.retire().unwrap_err();
        assert_eq!(
            rejected.error(),
            &TicketError::IncompleteWithdrawal { remaining: n }
        );
    }
}

#[test]
fn redeeming_past_the_end_is_nothing_to_withdraw() {
    let vault = funded_vault(&["A", "B"]);
    let mut ticket = create_withdraw_ticket(ids(&["A"]));
    ticket.redeem_next(&vault, handle(&vault, "A")).unwrap();

    assert_eq!(
        ticket.redeem_next(&vault, handle(&vault, "B")).unwrap_err(),
        TicketError::NothingToWithdraw
    );
    assert!(vault.holds(id("B")));
}

// ---------------------------------------------------------------------------
// Borrow Ticket
// ---------------------------------------------------------------------------

#[test]
fn borrow_and_return_in_either_order() {
    for return_order in [["A", "B"], ["B", "A"]] {
        let vault = funded_vault(&["A", "B"]);
        let mut ticket = create_borrow_ticket(ids(&["A", "B"]));

        let b = ticket.borrow(&vault, handle(&vault, "B")).unwrap();
        let a = ticket.borrow(&vault, handle(&vault, "A")).unwrap();
        assert!(vault.is_empty());

        let mut out = vec![a, b];
        for label in return_order {
            let pos = out.iter().position(|asset| asset.id() == id(label)).unwrap();
            ticket.put_back(&vault, out.remove(pos)).unwrap();
        }

        assert!(ticket.to_return().is_empty());
        assert!(ticket.is_retirable());
        assert!(ticket.retire().is_ok());
        assert_eq!(vault.len(), 2);
    }
}

#[test]
fn single_asset_loan_cannot_close_until_returned() {
    let vault = funded_vault(&["X"]);
    let mut ticket = create_borrow_ticket(ids(&["X"]));

    let x = ticket.borrow(&vault, handle(&vault, "X")).unwrap();
    assert!(ticket.withdrawal().pending().is_empty());
    assert_eq!(ticket.to_return(), ids(&["X"]).as_slice());

    let rejected = ticket.retire().unwrap_err();
    assert_eq!(rejected.error(), &TicketError::PendingReturns { outstanding: 1 });
    let mut ticket = rejected.into_inner();

    ticket.put_back(&vault, x).unwrap();
    assert!(ticket.to_return().is_empty());
    assert!(ticket.retire().is_ok());
    assert!(vault.holds(id("X")));
}

#[test]
fn retire_distinguishes_which_container_is_non_empty() {
    // Only inner.pending non-empty: return the one declared asset early by
    // handing in an asset that carries its identifier.
    let mut ticket = create_borrow_ticket(ids(&["Y"]));
    let vault = MemoryVault::new("side");
    ticket.put_back(&vault, Asset::labelled("Y", "nft")).unwrap();
    assert!(ticket.to_return().is_empty());
    let rejected = ticket.retire().unwrap_err();
    assert_eq!(
        rejected.error(),
        &TicketError::IncompleteWithdrawal { remaining: 1 }
    );

    // Only to_return non-empty.
    let vault = funded_vault(&["Z"]);
    let mut ticket = create_borrow_ticket(ids(&["Z"]));
    let _z = ticket.borrow(&vault, handle(&vault, "Z")).unwrap();
    let rejected = ticket.retire().unwrap_err();
    assert_eq!(rejected.error(), &TicketError::PendingReturns { outstanding: 1 });
}

#[test]
fn unexpected_return_is_an_idempotent_failure() {
    let vault = funded_vault(&["A", "B"]);
    let mut ticket = create_borrow_ticket(ids(&["A", "B"]));
    let _b = ticket.borrow(&vault, handle(&vault, "B")).unwrap();
    let before: Vec<AssetId> = ticket.to_return().to_vec();

    let mut stranger = Asset::labelled("stranger", "nft");
    for _ in 0..3 {
        let rejected = ticket.put_back(&vault, stranger).unwrap_err();
        assert_eq!(
            rejected.error(),
            &TicketError::UnexpectedAsset { asset: id("stranger") }
        );
        assert_eq!(ticket.to_return(), before.as_slice());
        stranger = rejected.into_inner();
    }
    assert!(!vault.holds(id("stranger")));
}

#[test]
fn returning_the_same_asset_twice_fails() {
    let vault = funded_vault(&["A"]);
    let mut ticket = create_borrow_ticket(ids(&["A"]));
    let a = ticket.borrow(&vault, handle(&vault, "A")).unwrap();
    ticket.put_back(&vault, a).unwrap();

    let a_again = vault.receive(handle(&vault, "A")).unwrap();
    let rejected = ticket.put_back(&vault, a_again).unwrap_err();
    assert_eq!(rejected.error(), &TicketError::UnexpectedAsset { asset: id("A") });
}

#[test]
fn returns_interleave_with_borrows_across_calls() {
    let vault = funded_vault(&["A", "B", "C"]);
    let mut ticket = BorrowTicket::new(ids(&["A", "B", "C"]));

    let c = ticket.borrow(&vault, handle(&vault, "C")).unwrap();
    ticket.put_back(&vault, c).unwrap();
    let b = ticket.borrow(&vault, handle(&vault, "B")).unwrap();
    let a = ticket.borrow(&vault, handle(&vault, "A")).unwrap();
    ticket.put_back(&vault, a).unwrap();

    assert_eq!(ticket.to_return(), ids(&["B"]).as_slice());
    ticket.put_back(&vault, b).unwrap();
    assert!(ticket.retire().is_ok());
    assert_eq!(vault.len(), 3);
}

// ---------------------------------------------------------------------------
// Vault collaborators
// ---------------------------------------------------------------------------

/// A vault whose handles lie: it ignores the requested identifier and
/// hands over whatever it has first.
struct SwappingVault {
    inner: MemoryVault,
    decoy: AssetId,
}

impl Vault for SwappingVault {
    type Asset = Asset;

    fn address(&self) -> VaultAddress {
        self.inner.address()
    }

    fn receive(&self, transfer: IncomingTransfer) -> Result<Asset, VaultError> {
        self.inner
            .receive(IncomingTransfer::new(transfer.recipient(), self.decoy))
    }

    fn send(&self, asset: Asset) {
        self.inner.send(asset)
    }
}

#[test]
fn asset_swapped_by_vault_is_sent_back() {
    let vault = SwappingVault {
        inner: funded_vault(&["A", "decoy"]),
        decoy: id("decoy"),
    };
    let mut ticket = create_withdraw_ticket(ids(&["A"]));

    let err = ticket
        .redeem_next(&vault, IncomingTransfer::new(vault.address(), id("A")))
        .unwrap_err();
    assert_eq!(
        err,
        TicketError::MismatchedAsset {
            expected: id("A"),
            actual: id("decoy"),
        }
    );
    assert_eq!(ticket.remaining(), 1);
    assert!(vault.inner.holds(id("decoy")));
    assert!(vault.inner.holds(id("A")));
}

#[test]
fn swapped_asset_returns_behind_its_twin() {
    let inner = funded_vault(&["A"]);
    inner.deposit(Asset::with_id(id("decoy"), "nft", "first"));
    inner.deposit(Asset::with_id(id("decoy"), "nft", "second"));
    let vault = SwappingVault {
        inner,
        decoy: id("decoy"),
    };
    let mut ticket = create_withdraw_ticket(ids(&["A"]));

    ticket
        .redeem_next(&vault, IncomingTransfer::new(vault.address(), id("A")))
        .unwrap_err();
    assert_eq!(vault.inner.count(id("decoy")), 2);

    let handle = vault.inner.incoming(id("decoy")).unwrap();
    assert_eq!(vault.inner.receive(handle).unwrap().note(), "second");
}

#[test]
fn tickets_share_one_vault_across_threads() {
    let labels: Vec<String> = (0..16).map(|i| format!("coin-{i}")).collect();
    let vault = Arc::new(MemoryVault::new("shared"));
    for label in &labels {
        vault.deposit(Asset::labelled(label, "coin"));
    }

    let workers: Vec<_> = labels
        .chunks(4)
        .map(|chunk| {
            let vault = Arc::clone(&vault);
            let chunk: Vec<AssetId> = chunk.iter().map(|l| id(l)).collect();
            thread::spawn(move || {
                let mut ticket = create_borrow_ticket(chunk.clone());
                let mut borrowed = Vec::new();
                while let Some(next) = ticket.withdrawal().next_expected() {
                    let transfer = IncomingTransfer::new(vault.address(), next);
                    borrowed.push(ticket.borrow(&vault, transfer).unwrap());
                }
                for asset in borrowed {
                    ticket.put_back(&vault, asset).unwrap();
                }
                ticket.retire().map_err(|r| r.error().clone())
            })
        })
        .collect();

    for worker in workers {
        assert_eq!(worker.join().unwrap(), Ok(()));
    }
    assert_eq!(vault.len(), labels.len());
}

#[test]
fn tickets_only_see_the_identifier() {
    let asset = Asset::mint("deed", "lot 42");
    assert_eq!(asset.asset_id(), asset.id());
}
