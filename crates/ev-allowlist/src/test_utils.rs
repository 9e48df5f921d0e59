//! Test helpers: an in-memory EVM journal and a capture of allow list trace
//! output.

use alloy_evm::{precompiles::PrecompileInput, EvmInternals};
use alloy_primitives::{Address, Log, U256};
use revm::{
    context::{
        journal::{Journal, JournalInner},
        BlockEnv, CfgEnv, TxEnv,
    },
    database::{CacheDB, EmptyDB},
    primitives::hardfork::SpecId,
    state::Account,
};
use std::{
    fmt,
    sync::{Arc, Mutex},
};
use tracing::{
    field::{Field, Visit},
    span::{Attributes, Id},
    subscriber::{set_default, DefaultGuard},
    Event, Level, Subscriber,
};
use tracing_subscriber::{
    layer::{Context, SubscriberExt},
    registry::LookupSpan,
    Layer,
};

const TARGET: &str = "allowlist";

/// Journal over an empty database plus the environment `EvmInternals` needs.
#[derive(Debug)]
pub(crate) struct TestEvm {
    journal: Journal<CacheDB<EmptyDB>>,
    block: BlockEnv,
    cfg: CfgEnv,
    tx: TxEnv,
}

impl TestEvm {
    pub(crate) fn new() -> Self {
        let mut journal = Journal::new_with_inner(CacheDB::default(), JournalInner::new());
        journal.inner.set_spec_id(SpecId::PRAGUE);
        Self {
            journal,
            block: BlockEnv::default(),
            cfg: CfgEnv::default(),
            tx: TxEnv::default(),
        }
    }

    pub(crate) fn internals(&mut self) -> EvmInternals<'_> {
        EvmInternals::new(&mut self.journal, &self.block, &self.cfg, &self.tx)
    }

    /// Builds a precompile call input whose target and bytecode address are
    /// both `target`.
    pub(crate) fn input<'a>(
        &'a mut self,
        target: Address,
        caller: Address,
        data: &'a [u8],
        gas: u64,
        is_static: bool,
    ) -> PrecompileInput<'a> {
        PrecompileInput {
            data,
            gas,
            caller,
            value: U256::ZERO,
            target_address: target,
            is_static,
            bytecode_address: target,
            internals: self.internals(),
        }
    }

    pub(crate) fn account(&self, address: Address) -> Option<&Account> {
        self.journal.inner.state.get(&address)
    }

    pub(crate) fn logs(&self) -> &[Log] {
        &self.journal.inner.logs
    }
}

/// A span opened while capturing, with its initial fields.
#[derive(Debug, Clone)]
pub(crate) struct CapturedSpan {
    pub(crate) name: &'static str,
    pub(crate) fields: Vec<(&'static str, String)>,
}

impl CapturedSpan {
    pub(crate) fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// An event emitted under the `allowlist` target.
#[derive(Debug, Clone)]
pub(crate) struct CapturedEvent {
    pub(crate) level: Level,
    pub(crate) message: String,
}

#[derive(Default)]
struct Fields(Vec<(&'static str, String)>);

impl Visit for Fields {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0.push((field.name(), format!("{value:?}")));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.push((field.name(), value.to_string()));
    }
}

#[derive(Debug, Default)]
struct Captured {
    spans: Vec<CapturedSpan>,
    events: Vec<CapturedEvent>,
}

/// Layer recording spans and `allowlist` events on the current thread.
#[derive(Debug, Clone, Default)]
pub(crate) struct TraceCapture {
    captured: Arc<Mutex<Captured>>,
}

impl TraceCapture {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Installs the capture as the thread's default subscriber until the guard
    /// drops.
    pub(crate) fn install(&self) -> DefaultGuard {
        set_default(tracing_subscriber::registry().with(self.clone()))
    }

    pub(crate) fn span(&self, name: &str) -> Option<CapturedSpan> {
        let captured = self.captured.lock().unwrap();
        captured.spans.iter().find(|s| s.name == name).cloned()
    }

    pub(crate) fn events_at(&self, level: Level) -> Vec<CapturedEvent> {
        let captured = self.captured.lock().unwrap();
        captured
            .events
            .iter()
            .filter(|e| e.level == level)
            .cloned()
            .collect()
    }
}

impl<S> Layer<S> for TraceCapture
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, _id: &Id, _ctx: Context<'_, S>) {
        let mut fields = Fields::default();
        attrs.record(&mut fields);

        self.captured.lock().unwrap().spans.push(CapturedSpan {
            name: attrs.metadata().name(),
            fields: fields.0,
        });
    }

    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if metadata.target() != TARGET {
            return;
        }

        let mut fields = Fields::default();
        event.record(&mut fields);
        let message = fields
            .0
            .into_iter()
            .find(|(key, _)| *key == "message")
            .map(|(_, value)| value)
            .unwrap_or_default();

        self.captured.lock().unwrap().events.push(CapturedEvent {
            level: *metadata.level(),
            message,
        });
    }
}
