// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Characteristic descriptors and live characteristic instances.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::watch;
use uuid::Uuid;

/// Value format of a characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// UTF-8 string.
    String,
    /// 64-bit float.
    Float,
}

/// Access permission of a characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Perm {
    /// Paired read.
    Read,
    /// Paired write.
    Write,
    /// Event notifications.
    Notify,
}

/// Static properties of a characteristic type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharacteristicProps {
    /// Value format.
    pub format: Format,
    /// Unit label, if any.
    pub unit: Option<&'static str>,
    /// Minimum value for numeric formats.
    pub min_value: Option<f64>,
    /// Maximum value for numeric formats.
    pub max_value: Option<f64>,
    /// Smallest step for numeric formats.
    pub min_step: Option<f64>,
    /// Permissions.
    pub perms: &'static [Perm],
}

impl CharacteristicProps {
    /// Read-only string properties used by the information service.
    pub const READ_ONLY_STRING: Self = Self {
        format: Format::String,
        unit: None,
        min_value: None,
        max_value: None,
        min_step: None,
        perms: &[Perm::Read],
    };

    /// Returns true if the characteristic can emit notifications.
    #[must_use]
    pub fn is_notify(&self) -> bool {
        self.perms.contains(&Perm::Notify)
    }

    /// Returns true if the characteristic can be written by the controller.
    #[must_use]
    pub fn is_writable(&self) -> bool {
        self.perms.contains(&Perm::Write)
    }

    /// Returns the default value for this format.
    #[must_use]
    pub fn default_value(&self) -> CharacteristicValue {
        match self.format {
            Format::String => CharacteristicValue::String(String::new()),
            Format::Float => CharacteristicValue::Float(self.min_value.unwrap_or(0.0)),
        }
    }

    /// Clamps numeric values into the declared range.
    #[must_use]
    pub fn clamp(&self, value: CharacteristicValue) -> CharacteristicValue {
        match value {
            CharacteristicValue::Float(v) => {
                let v = self.min_value.map_or(v, |min| v.max(min));
                let v = self.max_value.map_or(v, |max| v.min(max));
                CharacteristicValue::Float(v)
            }
            other => other,
        }
    }
}

/// A typed data point that can be attached to a service.
///
/// Types are plain descriptors registered in a
/// [`CapabilityRegistry`](super::CapabilityRegistry); there is no subtyping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharacteristicType {
    /// Display name.
    pub name: &'static str,
    /// HAP type UUID.
    pub uuid: Uuid,
    /// Static properties.
    pub props: CharacteristicProps,
}

/// A characteristic value.
#[derive(Debug, Clone, PartialEq)]
pub enum CharacteristicValue {
    /// String value.
    String(String),
    /// Float value.
    Float(f64),
}

impl CharacteristicValue {
    /// Returns the float payload, if any.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::String(_) => None,
        }
    }

    /// Returns the string payload, if any.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            Self::Float(_) => None,
        }
    }
}

impl From<f64> for CharacteristicValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for CharacteristicValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for CharacteristicValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl fmt::Display for CharacteristicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Float(v) => write!(f, "{v}"),
        }
    }
}

type Getter = Arc<dyn Fn() -> CharacteristicValue + Send + Sync>;

/// A live characteristic attached to a service.
///
/// Cloning yields another handle to the same characteristic, so the poller
/// that updates a value and the host that reads it share one instance.
///
/// Reads go through the getter installed with [`on_get`](Self::on_get) when
/// there is one; otherwise they return the last stored value. Updates are
/// broadcast to everyone holding a receiver from
/// [`subscribe`](Self::subscribe).
#[derive(Clone)]
pub struct Characteristic {
    inner: Arc<Inner>,
}

struct Inner {
    kind: CharacteristicType,
    value: watch::Sender<CharacteristicValue>,
    getter: RwLock<Option<Getter>>,
}

impl Characteristic {
    /// Creates a characteristic holding the default value of its type.
    #[must_use]
    pub fn new(kind: CharacteristicType) -> Self {
        let (value, _) = watch::channel(kind.props.default_value());
        Self {
            inner: Arc::new(Inner {
                kind,
                value,
                getter: RwLock::new(None),
            }),
        }
    }

    /// Returns the characteristic type.
    #[must_use]
    pub fn kind(&self) -> &CharacteristicType {
        &self.inner.kind
    }

    /// Returns the type UUID.
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.inner.kind.uuid
    }

    /// Installs the read handler used by [`read`](Self::read).
    pub fn on_get<F>(&self, getter: F) -> &Self
    where
        F: Fn() -> CharacteristicValue + Send + Sync + 'static,
    {
        *self.inner.getter.write() = Some(Arc::new(getter));
        self
    }

    /// Reads the value as the controller would.
    #[must_use]
    pub fn read(&self) -> CharacteristicValue {
        let getter = self.inner.getter.read().clone();
        match getter {
            Some(getter) => self.inner.kind.props.clamp(getter()),
            None => self.value(),
        }
    }

    /// Returns the stored value without invoking the getter.
    #[must_use]
    pub fn value(&self) -> CharacteristicValue {
        self.inner.value.borrow().clone()
    }

    /// Stores a value without notifying subscribers.
    pub fn set_value(&self, value: impl Into<CharacteristicValue>) -> &Self {
        let value = self.inner.kind.props.clamp(value.into());
        self.inner.value.send_if_modified(|current| {
            *current = value;
            false
        });
        self
    }

    /// Stores a value and notifies subscribers.
    pub fn update_value(&self, value: impl Into<CharacteristicValue>) -> &Self {
        let value = self.inner.kind.props.clamp(value.into());
        self.inner.value.send_replace(value);
        self
    }

    /// Subscribes to value updates.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CharacteristicValue> {
        self.inner.value.subscribe()
    }
}

impl fmt::Debug for Characteristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Characteristic")
            .field("name", &self.inner.kind.name)
            .field("value", &self.value())
            .field("has_getter", &self.inner.getter.read().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::hap::types::{ENERGY_IMPORT, NAME};

    #[test]
    fn new_characteristic_has_default_value() {
        assert_eq!(Characteristic::new(ENERGY_IMPORT).value().as_f64(), Some(0.0));
        assert_eq!(Characteristic::new(NAME).value().as_str(), Some(""));
    }

    #[test]
    fn read_prefers_getter() {
        let characteristic = Characteristic::new(ENERGY_IMPORT);
        characteristic.set_value(1.0);
        characteristic.on_get(|| CharacteristicValue::Float(2.5));

        assert_eq!(characteristic.read().as_f64(), Some(2.5));
        assert_eq!(characteristic.value().as_f64(), Some(1.0));
    }

    #[test]
    fn getter_runs_on_every_read() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let characteristic = Characteristic::new(ENERGY_IMPORT);
        characteristic.on_get(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            CharacteristicValue::Float(3.0)
        });

        let _ = characteristic.read();
        let _ = characteristic.read();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn values_are_clamped_to_range() {
        let characteristic = Characteristic::new(ENERGY_IMPORT);
        characteristic.update_value(-5.0);
        assert_eq!(characteristic.value().as_f64(), Some(0.0));
        characteristic.update_value(2_000_000.0);
        assert_eq!(characteristic.value().as_f64(), Some(1_000_000.0));
    }

    #[test]
    fn update_notifies_subscribers_but_set_does_not() {
        let characteristic = Characteristic::new(ENERGY_IMPORT);
        let mut rx = characteristic.subscribe();

        characteristic.set_value(1.0);
        assert!(!rx.has_changed().unwrap());

        characteristic.update_value(2.0);
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().as_f64(), Some(2.0));
    }

    #[test]
    fn clones_share_state() {
        let a = Characteristic::new(ENERGY_IMPORT);
        let b = a.clone();
        a.update_value(7.0);
        assert_eq!(b.value().as_f64(), Some(7.0));
    }

    #[test]
    fn energy_props() {
        let props = ENERGY_IMPORT.props;
        assert!(props.is_notify());
        assert!(!props.is_writable());
        assert_eq!(props.unit, Some("kWh"));
    }
}
