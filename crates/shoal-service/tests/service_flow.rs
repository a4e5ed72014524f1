// crates/shoal-service/tests/service_flow.rs
//
// End-to-end flows through the concurrent service: custody movement,
// capability checks, refunds on failed validation, and parallel
// operations on independent provers.

use std::sync::Arc;

use shoal_core::{AccountId, Custody, LedgerError, MarketplaceLedger};
use shoal_ledger::MOTES_PER_SHO;
use shoal_service::{InMemoryVault, ServiceConfig, StakingService};

fn account(byte: u8) -> AccountId {
    [byte; 32]
}

const OWNER: u8 = 9;
const AUTHORITY: u8 = 10;
const DELAY: u64 = 7 * 24 * 3600;

fn test_config() -> ServiceConfig {
    ServiceConfig {
        owner: "09".repeat(32),
        slashing_authority: "0a".repeat(32),
        ..ServiceConfig::default()
    }
}

async fn service_with_vault() -> (Arc<StakingService>, Arc<InMemoryVault>) {
    let vault = Arc::new(InMemoryVault::new());
    let service = StakingService::new(&test_config(), vault.clone(), 0).unwrap();
    (Arc::new(service), vault)
}

#[tokio::test]
async fn test_full_marketplace_flow() {
    let (service, vault) = service_with_vault().await;
    let prover = account(1);
    let staker = account(2);
    let marketplace = account(AUTHORITY);

    vault.mint(&prover, 10_000 * MOTES_PER_SHO).await;
    vault.mint(&staker, 5_000 * MOTES_PER_SHO).await;
    vault.mint(&marketplace, 1_000 * MOTES_PER_SHO).await;

    service
        .register_prover(prover, 1_000, MOTES_PER_SHO, 10_000 * MOTES_PER_SHO, 0)
        .await
        .unwrap();
    service
        .stake(staker, prover, 5_000 * MOTES_PER_SHO, 10)
        .await
        .unwrap();
    assert_eq!(vault.balance_of(&staker).await, 0);

    let (eligible, effective) = service
        .is_eligible(&prover, 10_000 * MOTES_PER_SHO)
        .await
        .unwrap();
    assert!(eligible);
    assert_eq!(effective, 15_000 * MOTES_PER_SHO);

    // Marketplace settles a job worth 1,000 SHO.
    let (commission, stakers_portion) = service
        .credit_rewards(&marketplace, &prover, 1_000 * MOTES_PER_SHO, 20)
        .await
        .unwrap();
    assert_eq!(commission, 100 * MOTES_PER_SHO);
    assert_eq!(stakers_portion, 900 * MOTES_PER_SHO);

    // Prover fails a later job and is slashed 30%.
    let slashed = service
        .slash_by_percentage(&account(AUTHORITY), &prover, 300_000, 30)
        .await
        .unwrap();
    assert_eq!(slashed, 4_500 * MOTES_PER_SHO);

    // Staker collects rewards and exits at the post-slash price.
    let rewards = service.withdraw_rewards(staker, prover, 40).await.unwrap();
    assert_eq!(rewards, 300 * MOTES_PER_SHO);
    service
        .request_unstake(staker, prover, 3_500 * MOTES_PER_SHO, 40)
        .await
        .unwrap();
    assert!(matches!(
        service.complete_unstake(staker, prover, 41).await,
        Err(LedgerError::UnstakeNotReady)
    ));
    let payout = service
        .complete_unstake(staker, prover, 40 + DELAY)
        .await
        .unwrap();
    assert_eq!(payout, 3_500 * MOTES_PER_SHO);
    assert_eq!(
        vault.balance_of(&staker).await,
        3_800 * MOTES_PER_SHO // 300 rewards + 3,500 unstake
    );

    // Prover takes commission plus its own reward share.
    let prover_rewards = service.withdraw_rewards(prover, prover, 50 + DELAY).await.unwrap();
    assert_eq!(prover_rewards, 700 * MOTES_PER_SHO);

    // Custody holds exactly what the ledger still owes: the prover's
    // remaining effective stake plus the treasury.
    let totals = service.network_totals().await;
    assert_eq!(totals.treasury_balance, 4_500 * MOTES_PER_SHO);
    assert_eq!(
        vault.custody_balance().await.unwrap(),
        (7_000 + 4_500) * MOTES_PER_SHO
    );

    let overview = service.prover_overview(prover, 60 + DELAY).await.unwrap();
    assert_eq!(overview.staker_count, 1);
    assert_eq!(overview.effective_stake, 7_000 * MOTES_PER_SHO);
}

#[tokio::test]
async fn test_slash_requires_capability() {
    let (service, vault) = service_with_vault().await;
    let prover = account(1);
    vault.mint(&prover, 100 * MOTES_PER_SHO).await;
    service
        .register_prover(prover, 0, 0, 100 * MOTES_PER_SHO, 0)
        .await
        .unwrap();

    assert!(matches!(
        service
            .slash_by_percentage(&account(3), &prover, 10_000, 10)
            .await,
        Err(LedgerError::Unauthorized(_))
    ));
    assert!(service
        .slash_by_percentage(&account(AUTHORITY), &prover, 10_000, 10)
        .await
        .is_ok());
}

#[tokio::test]
async fn test_failed_stake_is_refunded() {
    let (service, vault) = service_with_vault().await;
    let prover = account(1);
    let staker = account(2);
    vault.mint(&prover, 10 * MOTES_PER_SHO).await;
    vault.mint(&staker, 50 * MOTES_PER_SHO).await;
    // Prover demands 100 SHO of itself but bonded only 10: delegation is
    // rejected and the staker's funds come straight back.
    service
        .register_prover(prover, 0, 100 * MOTES_PER_SHO, 10 * MOTES_PER_SHO, 0)
        .await
        .unwrap();
    assert!(matches!(
        service.stake(staker, prover, 50 * MOTES_PER_SHO, 10).await,
        Err(LedgerError::BelowMinSelfStake { .. })
    ));
    assert_eq!(vault.balance_of(&staker).await, 50 * MOTES_PER_SHO);
}

#[tokio::test]
async fn test_unknown_prover_moves_no_funds() {
    let (service, vault) = service_with_vault().await;
    let staker = account(2);
    vault.mint(&staker, 50 * MOTES_PER_SHO).await;
    assert!(matches!(
        service.stake(staker, account(7), 50 * MOTES_PER_SHO, 0).await,
        Err(LedgerError::NotFound(_))
    ));
    assert_eq!(vault.balance_of(&staker).await, 50 * MOTES_PER_SHO);
}

#[tokio::test]
async fn test_owner_gating() {
    let (service, vault) = service_with_vault().await;
    let prover = account(1);
    vault.mint(&prover, 100 * MOTES_PER_SHO).await;
    service
        .register_prover(prover, 0, 0, 100 * MOTES_PER_SHO, 0)
        .await
        .unwrap();

    assert!(matches!(
        service.set_unstake_delay(account(3), 3_600).await,
        Err(LedgerError::Unauthorized(_))
    ));
    assert!(service.set_unstake_delay(account(OWNER), 3_600).await.is_ok());
    assert!(matches!(
        service
            .set_unstake_delay(account(OWNER), 31 * 24 * 3600)
            .await,
        Err(LedgerError::InvalidState(_))
    ));
    assert!(matches!(
        service.deactivate_prover(account(3), prover, 0).await,
        Err(LedgerError::Unauthorized(_))
    ));
    assert!(service
        .deactivate_prover(account(OWNER), prover, 0)
        .await
        .is_ok());
    assert!(service
        .reactivate_prover(account(OWNER), prover, 0)
        .await
        .is_ok());
}

#[tokio::test]
async fn test_emission_funding_is_permissionless() {
    let (service, vault) = service_with_vault().await;
    let donor = account(42);
    vault.mint(&donor, 1_000 * MOTES_PER_SHO).await;
    service
        .fund_emission(donor, 1_000 * MOTES_PER_SHO)
        .await
        .unwrap();
    let totals = service.network_totals().await;
    assert_eq!(totals.emission_budget_remaining, 1_000 * MOTES_PER_SHO);
    assert_eq!(
        vault.custody_balance().await.unwrap(),
        1_000 * MOTES_PER_SHO
    );
}

/// Operations on different provers proceed in parallel without corrupting
/// either account or the shared globals.
#[tokio::test]
async fn test_parallel_stakes_on_independent_provers() {
    let (service, vault) = service_with_vault().await;
    let alpha = account(1);
    let beta = account(2);
    vault.mint(&alpha, 1_000 * MOTES_PER_SHO).await;
    vault.mint(&beta, 1_000 * MOTES_PER_SHO).await;
    service
        .register_prover(alpha, 0, 0, 1_000 * MOTES_PER_SHO, 0)
        .await
        .unwrap();
    service
        .register_prover(beta, 0, 0, 1_000 * MOTES_PER_SHO, 0)
        .await
        .unwrap();

    let mut tasks = Vec::new();
    for i in 0..20u8 {
        let staker = account(100 + i);
        vault.mint(&staker, 10 * MOTES_PER_SHO).await;
        let target = if i % 2 == 0 { alpha } else { beta };
        let service = service.clone();
        tasks.push(tokio::spawn(async move {
            service
                .stake(staker, target, 10 * MOTES_PER_SHO, 5)
                .await
                .unwrap();
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let alpha_view = service.prover_overview(alpha, 10).await.unwrap();
    let beta_view = service.prover_overview(beta, 10).await.unwrap();
    assert_eq!(alpha_view.effective_stake, 1_100 * MOTES_PER_SHO);
    assert_eq!(beta_view.effective_stake, 1_100 * MOTES_PER_SHO);
    assert_eq!(alpha_view.staker_count, 11);
    let totals = service.network_totals().await;
    assert_eq!(
        totals.total_effective_active_stake,
        2_200 * MOTES_PER_SHO
    );
    assert_eq!(
        vault.custody_balance().await.unwrap(),
        2_200 * MOTES_PER_SHO
    );
}
