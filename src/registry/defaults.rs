//! Process-wide default registries
//!
//! The free [`bind`](crate::bind) and [`write`](crate::write) functions fall
//! back to these when no [`Negotiator`](crate::Negotiator) is attached to the
//! request. Hosts may replace or extend them at startup. Updates are atomic:
//! an exchange that already loaded a registry keeps using that snapshot, and
//! later exchanges see the new one.

use std::sync::{Arc, LazyLock};

use arc_swap::ArcSwap;

use super::{DecoderRegistry, EncoderRegistry};

static DEFAULT_DECODERS: LazyLock<ArcSwap<DecoderRegistry>> =
    LazyLock::new(|| ArcSwap::from_pointee(DecoderRegistry::default()));

static DEFAULT_ENCODERS: LazyLock<ArcSwap<EncoderRegistry>> =
    LazyLock::new(|| ArcSwap::from_pointee(EncoderRegistry::default()));

/// Snapshot of the default decoder registry
pub fn default_decoders() -> Arc<DecoderRegistry> {
    DEFAULT_DECODERS.load_full()
}

/// Snapshot of the default encoder registry
pub fn default_encoders() -> Arc<EncoderRegistry> {
    DEFAULT_ENCODERS.load_full()
}

/// Replace the default decoder registry
pub fn set_default_decoders(registry: DecoderRegistry) {
    tracing::debug!(tokens = ?registry, "replacing default decoders");
    DEFAULT_DECODERS.store(Arc::new(registry));
}

/// Replace the default encoder registry
pub fn set_default_encoders(registry: EncoderRegistry) {
    tracing::debug!(tokens = ?registry, "replacing default encoders");
    DEFAULT_ENCODERS.store(Arc::new(registry));
}

/// Modify the default decoder registry
///
/// `update` works on a copy which then replaces the current registry. It may
/// run more than once if another update races with it.
///
/// # Example
///
/// ```
/// use tower_negotiate::{codec::XmlFormat, default_decoders, update_default_decoders};
///
/// // Move XML behind every other format
/// update_default_decoders(|decoders| {
///     decoders.remove("xml");
///     decoders.insert("xml", XmlFormat);
/// });
/// assert_eq!(default_decoders().tokens().next(), Some("json"));
/// assert_eq!(default_decoders().tokens().last(), Some("xml"));
/// ```
pub fn update_default_decoders(mut update: impl FnMut(&mut DecoderRegistry)) {
    DEFAULT_DECODERS.rcu(|current| {
        let mut next = DecoderRegistry::clone(current);
        update(&mut next);
        Arc::new(next)
    });
}

/// Modify the default encoder registry
///
/// See [`update_default_decoders`].
pub fn update_default_encoders(mut update: impl FnMut(&mut EncoderRegistry)) {
    DEFAULT_ENCODERS.rcu(|current| {
        let mut next = EncoderRegistry::clone(current);
        update(&mut next);
        Arc::new(next)
    });
}
