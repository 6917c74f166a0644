mod common;

use common::{
    core, filter_a, filter_b, minter_m1, minter_m2, reload_project, resolver, seed_project, wei,
    DA_EXP_TYPE, SET_PRICE_TYPE,
};
use mintindex_core::model::configuration::ConfigId;
use mintindex_core::model::filter::{AllowlistScope, FilterGeneration};
use mintindex_core::model::project::ProjectId;
use mintindex_core::repo::lookup::TOKEN_ID_PROJECT_STRIDE;
use mintindex_core::service::config_values::ConfigChange;
use mintindex_core::{
    open_db_in_memory, EventOutcome, EventProcessor, MinterEvent, ProjectRef, ProjectRegistry,
    ProjectTarget, RegistryStore,
};
use num_bigint::BigInt;

fn target(minter: mintindex_core::Address, project_number: i64) -> ProjectTarget {
    ProjectTarget::new(minter, core(), ProjectRef::Number(BigInt::from(project_number)))
}

#[test]
fn shared_filter_lifecycle_detaches_on_removal() {
    let conn = open_db_in_memory().unwrap();
    let processor = EventProcessor::new(resolver(&conn));
    let store = processor.resolver().store();
    processor
        .resolver()
        .chain()
        .script_minter(&minter_m1(), SET_PRICE_TYPE, &filter_a());
    seed_project(store, 7, 1);

    let events = [
        MinterEvent::FilterDeployed {
            filter: filter_a(),
            generation: FilterGeneration::Shared,
            core_registry: None,
        },
        MinterEvent::FilterCanonicalized {
            filter: filter_a(),
            core_contract: core(),
        },
        MinterEvent::MinterApproved {
            filter: filter_a(),
            minter: minter_m1(),
            scope: AllowlistScope::Global,
        },
        MinterEvent::ProjectMinterRegistered(target(minter_m1(), 7)),
        MinterEvent::PriceUpdated {
            target: target(minter_m1(), 7),
            price: wei("1000"),
        },
    ];
    for (offset, event) in events.iter().enumerate() {
        let outcome = processor.process(event, 10 + offset as i64);
        assert_eq!(outcome, EventOutcome::Applied, "{}", event.name());
    }

    let minter = store.get_minter(&minter_m1()).unwrap().unwrap();
    assert!(minter.is_globally_allowlisted);
    let project = reload_project(store, 7);
    let config_id = ConfigId::for_pair(&minter_m1(), &project.id);
    assert_eq!(project.active_config, Some(config_id.clone()));
    assert_eq!(project.updated_at, 14);

    let removed = processor.process(&MinterEvent::ProjectMinterRemoved(target(minter_m1(), 7)), 20);
    assert!(removed.is_applied());
    assert!(reload_project(store, 7).active_config.is_none());
    let retained = store.get_configuration(&config_id).unwrap().unwrap();
    assert_eq!(retained.base_price, Some(wei("1000")));
}

#[test]
fn legacy_filter_removal_deletes_join_record() {
    let conn = open_db_in_memory().unwrap();
    let processor = EventProcessor::new(resolver(&conn));
    let store = processor.resolver().store();
    processor
        .resolver()
        .chain()
        .script_minter(&minter_m1(), SET_PRICE_TYPE, &filter_a());
    seed_project(store, 7, 1);

    for event in [
        MinterEvent::FilterDeployed {
            filter: filter_a(),
            generation: FilterGeneration::Legacy,
            core_registry: Some(core()),
        },
        MinterEvent::FilterCanonicalized {
            filter: filter_a(),
            core_contract: core(),
        },
        MinterEvent::ProjectMinterRegistered(target(minter_m1(), 7)),
        MinterEvent::ProjectMinterRemoved(target(minter_m1(), 7)),
    ] {
        assert!(processor.process(&event, 5).is_applied());
    }

    let config_id = ConfigId::for_pair(&minter_m1(), &ProjectId::new(core(), 7));
    assert!(store.get_configuration(&config_id).unwrap().is_none());
}

#[test]
fn token_ids_resolve_to_their_project() {
    let conn = open_db_in_memory().unwrap();
    let processor = EventProcessor::new(resolver(&conn));
    let store = processor.resolver().store();
    processor
        .resolver()
        .chain()
        .script_minter(&minter_m1(), DA_EXP_TYPE, &filter_a());
    seed_project(store, 3, 1);

    let token_id = BigInt::from(3 * TOKEN_ID_PROJECT_STRIDE + 17);
    assert_eq!(
        store.resolve_project_number(&ProjectRef::Token(token_id.clone())),
        BigInt::from(3)
    );
    assert_eq!(
        store.project_number_for_token(&BigInt::from(TOKEN_ID_PROJECT_STRIDE - 1)),
        BigInt::from(0)
    );

    processor.process(
        &MinterEvent::ProjectMinterRegistered(target(minter_m1(), 3)),
        2,
    );
    let outcome = processor.process(
        &MinterEvent::ProjectConfigChanged {
            target: ProjectTarget::new(minter_m1(), core(), ProjectRef::Token(token_id)),
            change: ConfigChange::set("maxInvocations", 10i64),
        },
        3,
    );
    assert!(outcome.is_applied());

    let config_id = ConfigId::for_pair(&minter_m1(), &ProjectId::new(core(), 3));
    let stored = store.get_configuration(&config_id).unwrap().unwrap();
    assert_eq!(
        stored.details().get("maxInvocations").and_then(|v| v.as_int()),
        Some(&BigInt::from(10))
    );
}

#[test]
fn failures_become_skipped_outcomes() {
    let conn = open_db_in_memory().unwrap();
    let processor = EventProcessor::new(resolver(&conn));
    let store = processor.resolver().store();
    seed_project(store, 7, 1);

    let unknown_project = processor.process(
        &MinterEvent::PriceUpdated {
            target: target(minter_m1(), 99),
            price: wei("1"),
        },
        5,
    );
    assert!(matches!(
        unknown_project,
        EventOutcome::Skipped {
            error_code: "project_not_found",
            ..
        }
    ));

    let unknown_filter = processor.process(
        &MinterEvent::MinterRevoked {
            filter: filter_b(),
            minter: minter_m2(),
            scope: AllowlistScope::Global,
        },
        6,
    );
    assert!(matches!(
        unknown_filter,
        EventOutcome::Skipped {
            error_code: "filter_not_found",
            ..
        }
    ));

    processor.resolver().chain().revert_call("getAllProjectMinters");
    let reverted = processor.process(
        &MinterEvent::FilterCanonicalized {
            filter: filter_a(),
            core_contract: core(),
        },
        7,
    );
    assert!(matches!(
        reverted,
        EventOutcome::Skipped {
            error_code: "external_call_reverted",
            ..
        }
    ));
    assert!(store.get_core_contract(&core()).unwrap().is_none());

    let unsynced = processor.process(
        &MinterEvent::ProjectMinterRegistered(target(minter_m2(), 7)),
        8,
    );
    assert!(!unsynced.is_applied());
    assert_eq!(reload_project(store, 7).updated_at, 1);
}

#[test]
fn registration_for_unknown_project_writes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let processor = EventProcessor::new(resolver(&conn));
    let store = processor.resolver().store();
    processor
        .resolver()
        .chain()
        .script_minter(&minter_m1(), SET_PRICE_TYPE, &filter_a());

    let outcome = processor.process(
        &MinterEvent::ProjectMinterRegistered(target(minter_m1(), 42)),
        3,
    );
    assert!(matches!(
        outcome,
        EventOutcome::Skipped {
            error_code: "project_not_found",
            ..
        }
    ));
    assert!(store.get_minter(&minter_m1()).unwrap().is_none());
}

#[test]
fn approval_survives_reverted_minter_sync() {
    let conn = open_db_in_memory().unwrap();
    let processor = EventProcessor::new(resolver(&conn));
    let store = processor.resolver().store();
    processor.process(
        &MinterEvent::FilterDeployed {
            filter: filter_a(),
            generation: FilterGeneration::Shared,
            core_registry: None,
        },
        1,
    );

    let outcome = processor.process(
        &MinterEvent::MinterApproved {
            filter: filter_a(),
            minter: minter_m2(),
            scope: AllowlistScope::Contract(core()),
        },
        2,
    );
    assert!(outcome.is_applied());
    assert!(store.get_minter(&minter_m2()).unwrap().is_none());
    let filter = store.get_filter(&filter_a()).unwrap().unwrap();
    assert!(filter.is_allowed(&minter_m2(), &core()));
}

#[test]
fn exponential_auction_event_sets_estimated_end() {
    let conn = open_db_in_memory().unwrap();
    let processor = EventProcessor::new(resolver(&conn));
    let store = processor.resolver().store();
    processor
        .resolver()
        .chain()
        .script_minter(&minter_m1(), DA_EXP_TYPE, &filter_a());
    seed_project(store, 7, 1);
    processor.process(
        &MinterEvent::ProjectMinterRegistered(target(minter_m1(), 7)),
        2,
    );

    let outcome = processor.process(
        &MinterEvent::ExponentialAuctionSet {
            target: target(minter_m1(), 7),
            start_time: 100,
            half_life_seconds: 381,
            start_price: wei("2000000000000000000"),
            base_price: wei("80000000000000000"),
        },
        3,
    );
    assert!(outcome.is_applied());
    let config_id = ConfigId::for_pair(&minter_m1(), &ProjectId::new(core(), 7));
    let stored = store.get_configuration(&config_id).unwrap().unwrap();
    assert_eq!(stored.approximate_exp_end_time, Some(1_898));

    assert!(processor
        .process(&MinterEvent::AuctionReset(target(minter_m1(), 7)), 4)
        .is_applied());
    let reset = store.get_configuration(&config_id).unwrap().unwrap();
    assert_eq!(reset.approximate_exp_end_time, None);
}
