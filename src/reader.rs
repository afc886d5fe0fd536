//! Reader/checkpoint contract (§4.F): `get`, `ack`, `is_acked`, `commit`,
//! `registry_snapshot`. Iteration sugar over the entry stream is left to
//! the caller, per the distilled spec's scope cut (§1).

use crate::{engine::Engine, err_at, Entry, Registry, Result, Value};

/// What `ack` accepts: a bare pk, a saved [Entry], or — mirroring the
/// source's dynamically-typed argument — an arbitrary [Value], which is
/// only meaningful when it happens to be `Value::Uint`. Any other `Value`
/// reproduces the source's *type-error* boundary case (§8, scenario 5).
pub enum Ack {
    Pk(u64),
    Entry(Entry),
    Value(Value),
}

impl From<u64> for Ack {
    fn from(pk: u64) -> Ack {
        Ack::Pk(pk)
    }
}

impl From<Entry> for Ack {
    fn from(entry: Entry) -> Ack {
        Ack::Entry(entry)
    }
}

impl From<Value> for Ack {
    fn from(value: Value) -> Ack {
        Ack::Value(value)
    }
}

/// A named or anonymous cursor bound to one reader's acknowledgement
/// state. The in-memory delta accumulated by `ack` is merged into the
/// stored registry on `commit`, and — best-effort — on `Drop`, mirroring
/// the source's scope-exit save (§4.F).
pub struct Reader<'engine> {
    engine: &'engine Engine,
    name: Option<String>,
    stored: Registry,
    delta: Registry,
}

impl<'engine> Reader<'engine> {
    pub(crate) fn named(engine: &'engine Engine, name: String, stored: Registry) -> Reader<'engine> {
        Reader {
            engine,
            name: Some(name),
            stored,
            delta: Registry::new(),
        }
    }

    pub(crate) fn anonymous(engine: &'engine Engine) -> Reader<'engine> {
        Reader {
            engine,
            name: None,
            stored: Registry::new(),
            delta: Registry::new(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Fetch the entry at `pk`, failing with *not-found* if it has been
    /// reclaimed or never existed.
    pub fn get(&self, pk: u64) -> Result<Entry> {
        self.engine.get_entry(pk)
    }

    /// `pk ∈ registry`, checking both the durable registry and this
    /// reader's uncommitted delta.
    pub fn is_acked(&self, pk: u64) -> bool {
        self.stored.contains(pk) || self.delta.contains(pk)
    }

    /// Record `target` as acknowledged in the in-memory delta. Checks run
    /// in the order the source raises them: unsaved entry first, then
    /// anonymous reader, then wrong-typed argument.
    pub fn ack<A: Into<Ack>>(&mut self, target: A) -> Result<()> {
        let target = target.into();

        if let Ack::Entry(entry) = &target {
            if !entry.is_saved() {
                return err_at!(InvalidValue, msg: "cannot ack an unsaved entry");
            }
        }
        if self.name.is_none() {
            return err_at!(IllegalState, msg: "cannot ack on an anonymous reader");
        }

        let pk = match target {
            Ack::Entry(entry) => entry.pk().unwrap(),
            Ack::Pk(pk) => pk,
            Ack::Value(Value::Uint(pk)) => pk,
            Ack::Value(_) => {
                return err_at!(
                    TypeError,
                    msg: "ack argument is neither an entry nor a non-negative integer"
                );
            }
        };
        self.delta.add(pk);
        Ok(())
    }

    /// Merge any pending acks into the stored registry. A no-op if nothing
    /// has been acked since the last commit (§4.F: monotonic and
    /// idempotent).
    pub fn commit(&mut self) -> Result<()> {
        if self.delta.is_empty() {
            return Ok(());
        }
        let name = self.name.as_ref().expect("ack already refused on anonymous reader");
        self.engine.save_registry(name, &self.delta)?;
        self.stored = self.stored.union(&self.delta);
        self.delta = Registry::new();
        Ok(())
    }

    /// `stored ∪ delta`, the view this reader currently has of its own
    /// acknowledgement set.
    pub fn registry_snapshot(&self) -> Registry {
        self.stored.union(&self.delta)
    }
}

impl<'engine> Drop for Reader<'engine> {
    fn drop(&mut self) {
        if self.delta.is_empty() {
            return;
        }
        if let Some(name) = self.name.clone() {
            if let Err(err) = self.engine.save_registry(&name, &self.delta) {
                tracing::error!(reader = %name, error = %err, "failed to persist ack delta on drop");
            }
        }
    }
}
