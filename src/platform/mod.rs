// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Platform registration with the host bridge.
//!
//! [`PlatformRegistrar`] is the object the host drives: it is created with
//! the platform configuration, receives cached accessories through
//! [`configure_accessory`](PlatformRegistrar::configure_accessory), and
//! starts the device pollers on
//! [`did_finish_launching`](PlatformRegistrar::did_finish_launching).

mod registrar;

pub use registrar::PlatformRegistrar;
