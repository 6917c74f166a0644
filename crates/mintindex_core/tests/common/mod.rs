#![allow(dead_code)]

use mintindex_core::chain::{AuctionParameters, ChainCallError, ChainResult, ChainState, PriceInfo};
use mintindex_core::model::filter::{FilterGeneration, MinterFilter};
use mintindex_core::model::minter::Minter;
use mintindex_core::model::project::{Project, ProjectId};
use mintindex_core::{
    Address, ConfigurationResolver, RegistryStore, ResolverConfig, SqliteRegistryStore,
};
use num_bigint::BigInt;
use rusqlite::Connection;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

pub const DA_EXP_TYPE: &str = "MinterDAExpV5";
pub const DA_LIN_TYPE: &str = "MinterDALinV5";
pub const SET_PRICE_TYPE: &str = "MinterSetPriceV5";

pub fn addr(tag: u8) -> Address {
    let mut bytes = [0u8; 20];
    bytes[19] = tag;
    Address::from_bytes(bytes)
}

pub fn core() -> Address {
    addr(0xc0)
}

pub fn filter_a() -> Address {
    addr(0xf1)
}

pub fn filter_b() -> Address {
    addr(0xf2)
}

pub fn minter_m1() -> Address {
    addr(0xa1)
}

pub fn minter_m2() -> Address {
    addr(0xa2)
}

pub fn wei(value: &str) -> BigInt {
    value.parse().expect("decimal integer")
}

/// Chain-state fake answering from scripted tables; unscripted calls revert.
#[derive(Default)]
pub struct ScriptedChain {
    minters: RefCell<HashMap<Address, (String, Address)>>,
    prices: RefCell<HashMap<(Address, BigInt), PriceInfo>>,
    auctions: RefCell<HashMap<(Address, BigInt), AuctionParameters>>,
    registrations: RefCell<HashMap<(Address, Address), Vec<(BigInt, Address)>>>,
    reverting: RefCell<HashSet<&'static str>>,
}

impl ScriptedChain {
    pub fn script_minter(&self, minter: &Address, minter_type: &str, filter: &Address) {
        self.minters
            .borrow_mut()
            .insert(minter.clone(), (minter_type.to_string(), filter.clone()));
    }

    pub fn script_price(&self, minter: &Address, project_number: i64, info: PriceInfo) {
        self.prices
            .borrow_mut()
            .insert((minter.clone(), BigInt::from(project_number)), info);
    }

    pub fn script_auction(&self, minter: &Address, project_number: i64, params: AuctionParameters) {
        self.auctions
            .borrow_mut()
            .insert((minter.clone(), BigInt::from(project_number)), params);
    }

    pub fn script_registrations(
        &self,
        filter: &Address,
        core_contract: &Address,
        pairs: Vec<(i64, Address)>,
    ) {
        let pairs = pairs
            .into_iter()
            .map(|(number, minter)| (BigInt::from(number), minter))
            .collect();
        self.registrations
            .borrow_mut()
            .insert((filter.clone(), core_contract.clone()), pairs);
    }

    pub fn revert_call(&self, call: &'static str) {
        self.reverting.borrow_mut().insert(call);
    }

    pub fn clear_reverts(&self) {
        self.reverting.borrow_mut().clear();
    }

    fn check(&self, call: &'static str, target: &Address) -> ChainResult<()> {
        if self.reverting.borrow().contains(call) {
            return Err(ChainCallError::reverted(call, target, "scripted revert"));
        }
        Ok(())
    }
}

impl ChainState for ScriptedChain {
    fn minter_type(&self, minter: &Address) -> ChainResult<String> {
        self.check("minterType", minter)?;
        self.minters
            .borrow()
            .get(minter)
            .map(|(minter_type, _)| minter_type.clone())
            .ok_or_else(|| ChainCallError::reverted("minterType", minter, "no code"))
    }

    fn minter_filter(&self, minter: &Address) -> ChainResult<Address> {
        self.check("minterFilterAddress", minter)?;
        self.minters
            .borrow()
            .get(minter)
            .map(|(_, filter)| filter.clone())
            .ok_or_else(|| ChainCallError::reverted("minterFilterAddress", minter, "no code"))
    }

    fn price_info(
        &self,
        minter: &Address,
        _core_contract: &Address,
        project_number: &BigInt,
    ) -> ChainResult<PriceInfo> {
        self.check("getPriceInfo", minter)?;
        self.prices
            .borrow()
            .get(&(minter.clone(), project_number.clone()))
            .cloned()
            .ok_or_else(|| ChainCallError::reverted("getPriceInfo", minter, "unknown project"))
    }

    fn auction_parameters(
        &self,
        minter: &Address,
        _core_contract: &Address,
        project_number: &BigInt,
    ) -> ChainResult<AuctionParameters> {
        self.check("projectAuctionParameters", minter)?;
        Ok(self
            .auctions
            .borrow()
            .get(&(minter.clone(), project_number.clone()))
            .cloned()
            .unwrap_or(AuctionParameters::Unset))
    }

    fn registered_project_minters(
        &self,
        filter: &Address,
        core_contract: &Address,
    ) -> ChainResult<Vec<(BigInt, Address)>> {
        self.check("getAllProjectMinters", filter)?;
        Ok(self
            .registrations
            .borrow()
            .get(&(filter.clone(), core_contract.clone()))
            .cloned()
            .unwrap_or_default())
    }
}

pub type TestResolver<'conn> = ConfigurationResolver<SqliteRegistryStore<'conn>, ScriptedChain>;

pub fn resolver(conn: &Connection) -> TestResolver<'_> {
    resolver_with(conn, ResolverConfig::default())
}

pub fn resolver_with(conn: &Connection, config: ResolverConfig) -> TestResolver<'_> {
    let store = SqliteRegistryStore::try_new(conn).expect("migrated connection");
    ConfigurationResolver::new(store, ScriptedChain::default(), config)
}

pub fn seed_project<S: RegistryStore>(store: &S, number: i64, timestamp: i64) -> Project {
    let project = Project::new(ProjectId::new(core(), number), timestamp);
    store.put_project(&project).expect("seed project");
    project
}

pub fn seed_minter<S: RegistryStore>(
    store: &S,
    id: &Address,
    minter_type: &str,
    filter: &Address,
    timestamp: i64,
) -> Minter {
    let minter = Minter::new(id.clone(), minter_type, filter.clone(), timestamp);
    store.put_minter(&minter).expect("seed minter");
    minter
}

pub fn seed_filter<S: RegistryStore>(
    store: &S,
    id: &Address,
    generation: FilterGeneration,
    timestamp: i64,
) -> MinterFilter {
    let filter = MinterFilter::new(id.clone(), generation, timestamp);
    store.put_filter(&filter).expect("seed filter");
    filter
}

pub fn reload_project<S: RegistryStore>(store: &S, number: i64) -> Project {
    store
        .get_project(&ProjectId::new(core(), number))
        .expect("load project")
        .expect("project exists")
}
