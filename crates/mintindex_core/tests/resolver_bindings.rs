mod common;

use common::{
    core, filter_a, filter_b, minter_m1, minter_m2, reload_project, resolver, resolver_with,
    seed_filter, seed_minter, seed_project, SET_PRICE_TYPE,
};
use mintindex_core::model::configuration::ConfigId;
use mintindex_core::model::filter::{AllowlistScope, FilterGeneration};
use mintindex_core::model::project::ProjectId;
use mintindex_core::service::resolver::{BindingKey, ProjectState};
use mintindex_core::{
    open_db_in_memory, RegistryStore, ResolverConfig, ResolverError, UnlinkPolicy,
};
use num_bigint::BigInt;

#[test]
fn registering_under_canonical_filter_activates_and_switches() {
    let conn = open_db_in_memory().unwrap();
    let resolver = resolver(&conn);
    let store = resolver.store();
    seed_filter(store, &filter_a(), FilterGeneration::Shared, 1);
    let m1 = seed_minter(store, &minter_m1(), SET_PRICE_TYPE, &filter_a(), 1);
    let m2 = seed_minter(store, &minter_m2(), SET_PRICE_TYPE, &filter_a(), 1);
    seed_project(store, 7, 1);
    resolver.canonicalize_filter(&filter_a(), &core(), 5).unwrap();

    let mut project = reload_project(store, 7);
    assert!(project.active_config.is_none());

    resolver.register_binding(&mut project, &m1, 10).unwrap();
    let stored = reload_project(store, 7);
    assert_eq!(
        stored.active_config,
        Some(ConfigId::for_pair(&m1.id, &stored.id))
    );
    assert_eq!(stored.updated_at, 10);

    let mut project = stored;
    resolver.register_binding(&mut project, &m2, 20).unwrap();
    let stored = reload_project(store, 7);
    assert_eq!(
        stored.active_config,
        Some(ConfigId::for_pair(&m2.id, &stored.id))
    );

    let mut project = stored;
    let unlinked = resolver.remove_binding(&mut project, &m1, 30).unwrap();
    assert!(!unlinked);
    let stored = reload_project(store, 7);
    assert_eq!(
        stored.active_config,
        Some(ConfigId::for_pair(&m2.id, &stored.id))
    );
    assert_eq!(stored.updated_at, 20);
}

#[test]
fn registering_under_non_canonical_filter_only_persists_join_record() {
    let conn = open_db_in_memory().unwrap();
    let resolver = resolver(&conn);
    let store = resolver.store();
    let m2 = seed_minter(store, &minter_m2(), SET_PRICE_TYPE, &filter_b(), 1);
    seed_project(store, 7, 1);
    resolver.canonicalize_filter(&filter_a(), &core(), 5).unwrap();

    let mut project = reload_project(store, 7);
    let configuration = resolver.register_binding(&mut project, &m2, 10).unwrap();

    let stored = reload_project(store, 7);
    assert!(stored.active_config.is_none());
    assert_eq!(stored.updated_at, 5);
    assert!(store.get_configuration(&configuration.id).unwrap().is_some());
}

#[test]
fn canonicalizing_filter_without_registrations_clears_active_configs() {
    let conn = open_db_in_memory().unwrap();
    let resolver = resolver(&conn);
    let store = resolver.store();
    let m1 = seed_minter(store, &minter_m1(), SET_PRICE_TYPE, &filter_a(), 1);
    seed_project(store, 7, 1);
    resolver.canonicalize_filter(&filter_a(), &core(), 2).unwrap();
    let mut project = reload_project(store, 7);
    resolver.register_binding(&mut project, &m1, 3).unwrap();
    assert!(reload_project(store, 7).active_config.is_some());

    let report = resolver.canonicalize_filter(&filter_b(), &core(), 40).unwrap();
    assert_eq!(report.cleared, 1);
    assert_eq!(report.activated, 0);

    let stored = reload_project(store, 7);
    assert!(stored.active_config.is_none());
    assert_eq!(stored.updated_at, 40);
    let contract = store.get_core_contract(&core()).unwrap().unwrap();
    assert_eq!(contract.canonical_filter, Some(filter_b()));
}

#[test]
fn canonicalizing_filter_rebinds_reported_pairs_and_skips_unknown_projects() {
    let conn = open_db_in_memory().unwrap();
    let resolver = resolver(&conn);
    let store = resolver.store();
    seed_minter(store, &minter_m1(), SET_PRICE_TYPE, &filter_a(), 1);
    let m2 = seed_minter(store, &minter_m2(), SET_PRICE_TYPE, &filter_b(), 1);
    seed_project(store, 7, 1);
    resolver
        .chain()
        .script_registrations(&filter_b(), &core(), vec![(7, minter_m2()), (8, minter_m2())]);

    let report = resolver.canonicalize_filter(&filter_b(), &core(), 50).unwrap();
    assert_eq!(report.activated, 1);
    assert_eq!(report.skipped, 1);
    let stored = reload_project(store, 7);
    assert_eq!(
        stored.active_config,
        Some(ConfigId::for_pair(&m2.id, &stored.id))
    );

    let again = resolver.canonicalize_filter(&filter_b(), &core(), 50).unwrap();
    assert_eq!(again.activated, 1);
    assert_eq!(reload_project(store, 7), stored);
    assert!(store
        .get_project(&ProjectId::new(core(), 8))
        .unwrap()
        .is_none());
}

#[test]
fn reverted_registration_read_leaves_state_untouched() {
    let conn = open_db_in_memory().unwrap();
    let resolver = resolver(&conn);
    let store = resolver.store();
    let m1 = seed_minter(store, &minter_m1(), SET_PRICE_TYPE, &filter_a(), 1);
    seed_project(store, 7, 1);
    resolver.canonicalize_filter(&filter_a(), &core(), 2).unwrap();
    let mut project = reload_project(store, 7);
    resolver.register_binding(&mut project, &m1, 3).unwrap();
    let before = reload_project(store, 7);

    resolver.chain().revert_call("getAllProjectMinters");
    let err = resolver
        .canonicalize_filter(&filter_b(), &core(), 60)
        .expect_err("revert must abort");
    assert!(matches!(err, ResolverError::ExternalCallReverted(_)));

    assert_eq!(reload_project(store, 7), before);
    let contract = store.get_core_contract(&core()).unwrap().unwrap();
    assert_eq!(contract.canonical_filter, Some(filter_a()));
}

#[test]
fn set_allowed_is_idempotent_and_tracks_global_flag() {
    let conn = open_db_in_memory().unwrap();
    let resolver = resolver(&conn);
    let store = resolver.store();
    seed_filter(store, &filter_a(), FilterGeneration::Shared, 1);
    seed_minter(store, &minter_m1(), SET_PRICE_TYPE, &filter_a(), 1);

    let first = resolver
        .set_allowed(&filter_a(), &minter_m1(), &AllowlistScope::Global, true, 10)
        .unwrap();
    let second = resolver
        .set_allowed(&filter_a(), &minter_m1(), &AllowlistScope::Global, true, 11)
        .unwrap();
    assert!(first);
    assert!(!second);

    let filter = store.get_filter(&filter_a()).unwrap().unwrap();
    assert_eq!(filter.global_allowlist, vec![minter_m1()]);
    assert_eq!(filter.updated_at, 10);
    assert!(store.get_minter(&minter_m1()).unwrap().unwrap().is_globally_allowlisted);

    resolver
        .set_allowed(&filter_a(), &minter_m1(), &AllowlistScope::Global, false, 12)
        .unwrap();
    assert!(!store.get_minter(&minter_m1()).unwrap().unwrap().is_globally_allowlisted);
    assert!(store
        .get_filter(&filter_a())
        .unwrap()
        .unwrap()
        .global_allowlist
        .is_empty());
}

#[test]
fn contract_scoped_allow_list_does_not_touch_bindings() {
    let conn = open_db_in_memory().unwrap();
    let resolver = resolver(&conn);
    let store = resolver.store();
    seed_filter(store, &filter_a(), FilterGeneration::Shared, 1);
    let m1 = seed_minter(store, &minter_m1(), SET_PRICE_TYPE, &filter_a(), 1);
    seed_project(store, 7, 1);
    resolver.canonicalize_filter(&filter_a(), &core(), 2).unwrap();
    let mut project = reload_project(store, 7);
    resolver.register_binding(&mut project, &m1, 3).unwrap();
    let before = reload_project(store, 7);

    let scope = AllowlistScope::Contract(core());
    resolver.set_allowed(&filter_a(), &minter_m1(), &scope, true, 4).unwrap();
    resolver.set_allowed(&filter_a(), &minter_m1(), &scope, false, 5).unwrap();

    let filter = store.get_filter(&filter_a()).unwrap().unwrap();
    assert!(!filter.is_allowed(&minter_m1(), &core()));
    assert!(!store.get_minter(&minter_m1()).unwrap().unwrap().is_globally_allowlisted);
    assert_eq!(reload_project(store, 7), before);
}

#[test]
fn set_allowed_on_unknown_filter_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let resolver = resolver(&conn);
    let err = resolver
        .set_allowed(&filter_a(), &minter_m1(), &AllowlistScope::Global, true, 1)
        .unwrap_err();
    assert!(matches!(err, ResolverError::FilterNotFound(_)));
    assert!(err.is_not_found());
}

#[test]
fn detached_join_record_is_reused_on_reregistration() {
    let conn = open_db_in_memory().unwrap();
    let resolver = resolver(&conn);
    let store = resolver.store();
    let m1 = seed_minter(store, &minter_m1(), SET_PRICE_TYPE, &filter_a(), 1);
    seed_project(store, 7, 1);
    resolver.canonicalize_filter(&filter_a(), &core(), 2).unwrap();
    let key = BindingKey::new(minter_m1(), core(), 7);
    resolver.set_base_price(&key, BigInt::from(5_000u32), 3).unwrap();
    let mut project = reload_project(store, 7);
    resolver.register_binding(&mut project, &m1, 4).unwrap();

    assert!(resolver.remove_binding(&mut project, &m1, 5).unwrap());
    assert!(reload_project(store, 7).active_config.is_none());
    let detached = store.get_configuration(&key.config_id()).unwrap().unwrap();
    assert_eq!(detached.base_price, Some(BigInt::from(5_000u32)));

    assert!(!resolver.remove_binding(&mut project, &m1, 6).unwrap());

    let reused = resolver.register_binding(&mut project, &m1, 7).unwrap();
    assert_eq!(reused.base_price, Some(BigInt::from(5_000u32)));
    assert_eq!(reused.created_at, 3);
    assert_eq!(reload_project(store, 7).active_config, Some(key.config_id()));
}

#[test]
fn deleted_join_record_starts_clean_on_reregistration() {
    let conn = open_db_in_memory().unwrap();
    let resolver = resolver_with(
        &conn,
        ResolverConfig {
            retain_on_unlink: false,
        },
    );
    let store = resolver.store();
    let m1 = seed_minter(store, &minter_m1(), SET_PRICE_TYPE, &filter_a(), 1);
    seed_project(store, 7, 1);
    resolver.canonicalize_filter(&filter_a(), &core(), 2).unwrap();
    let key = BindingKey::new(minter_m1(), core(), 7);
    resolver.set_base_price(&key, BigInt::from(5_000u32), 3).unwrap();
    let mut project = reload_project(store, 7);
    resolver.register_binding(&mut project, &m1, 4).unwrap();

    assert!(resolver.remove_binding(&mut project, &m1, 5).unwrap());
    assert!(store.get_configuration(&key.config_id()).unwrap().is_none());

    let fresh = resolver.register_binding(&mut project, &m1, 6).unwrap();
    assert_eq!(fresh.base_price, None);
    assert!(!fresh.price_is_configured);
    assert_eq!(fresh.created_at, 6);
}

#[test]
fn per_call_policy_overrides_resolver_default() {
    let conn = open_db_in_memory().unwrap();
    let resolver = resolver(&conn);
    let store = resolver.store();
    let m1 = seed_minter(store, &minter_m1(), SET_PRICE_TYPE, &filter_a(), 1);
    seed_project(store, 7, 1);
    resolver.canonicalize_filter(&filter_a(), &core(), 2).unwrap();
    let mut project = reload_project(store, 7);
    let configuration = resolver.register_binding(&mut project, &m1, 3).unwrap();

    assert!(resolver
        .remove_binding_with(&mut project, &m1, 4, UnlinkPolicy::Delete)
        .unwrap());
    assert!(store.get_configuration(&configuration.id).unwrap().is_none());
}

#[test]
fn dangling_active_pointer_is_cleared() {
    let conn = open_db_in_memory().unwrap();
    let resolver = resolver(&conn);
    let store = resolver.store();
    let m2 = seed_minter(store, &minter_m2(), SET_PRICE_TYPE, &filter_b(), 1);
    let mut project = seed_project(store, 7, 1);
    project.active_config = Some(ConfigId::from_stored("0xdead-7"));
    store.put_project(&project).unwrap();

    assert_eq!(
        resolver.project_state(&project.id).unwrap(),
        ProjectState::Unconfigured
    );

    let mut project = reload_project(store, 7);
    resolver.register_binding(&mut project, &m2, 9).unwrap();
    let stored = reload_project(store, 7);
    assert!(stored.active_config.is_none());
    assert_eq!(stored.updated_at, 9);
}

#[test]
fn pointer_to_another_projects_record_is_superseded() {
    let conn = open_db_in_memory().unwrap();
    let resolver = resolver(&conn);
    let store = resolver.store();
    let m1 = seed_minter(store, &minter_m1(), SET_PRICE_TYPE, &filter_a(), 1);
    seed_project(store, 7, 1);
    seed_project(store, 8, 1);
    resolver.canonicalize_filter(&filter_a(), &core(), 2).unwrap();
    let mut other = reload_project(store, 8);
    let foreign = resolver.register_binding(&mut other, &m1, 3).unwrap();

    let mut project = reload_project(store, 7);
    project.active_config = Some(foreign.id.clone());
    store.put_project(&project).unwrap();

    let mut project = reload_project(store, 7);
    let removed = resolver.remove_binding(&mut project, &m1, 10).unwrap();
    assert!(!removed);
    assert!(reload_project(store, 7).active_config.is_none());
    assert_eq!(reload_project(store, 8).active_config, Some(foreign.id));
}

#[test]
fn resolving_unknown_project_never_creates_it() {
    let conn = open_db_in_memory().unwrap();
    let resolver = resolver(&conn);
    let store = resolver.store();
    seed_minter(store, &minter_m1(), SET_PRICE_TYPE, &filter_a(), 1);

    let err = resolver
        .resolve_or_create_binding(&minter_m1(), &core(), &BigInt::from(99), 5)
        .unwrap_err();
    assert!(matches!(err, ResolverError::ProjectNotFound(_)));
    assert!(store
        .get_project(&ProjectId::new(core(), 99))
        .unwrap()
        .is_none());
}

#[test]
fn resolving_unknown_minter_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let resolver = resolver(&conn);
    seed_project(resolver.store(), 7, 1);

    let err = resolver
        .resolve_or_create_binding(&minter_m1(), &core(), &BigInt::from(7), 5)
        .unwrap_err();
    assert!(matches!(err, ResolverError::MinterNotFound(_)));
}

#[test]
fn resolved_binding_is_built_in_memory_only() {
    let conn = open_db_in_memory().unwrap();
    let resolver = resolver(&conn);
    let store = resolver.store();
    seed_minter(store, &minter_m1(), SET_PRICE_TYPE, &filter_a(), 1);
    seed_project(store, 7, 1);

    let binding = resolver
        .resolve_or_create_binding(&minter_m1(), &core(), &BigInt::from(7), 5)
        .unwrap();
    assert!(!binding.is_active());
    assert_eq!(binding.configuration.created_at, 5);
    assert!(store
        .get_configuration(&binding.configuration.id)
        .unwrap()
        .is_none());
    assert!(resolver
        .bindings_for_project(&binding.project.id)
        .unwrap()
        .is_empty());
}
