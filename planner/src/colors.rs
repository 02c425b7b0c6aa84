// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::collections::HashMap;
use std::fmt;

use common::Employee;
use serde::{Serialize, Serializer};

const SATURATION: u8 = 70;
const LIGHTNESS: u8 = 50;

/// A fixed-saturation, fixed-lightness color; only the hue varies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HslColor {
    pub hue: u16,
    pub saturation: u8,
    pub lightness: u8,
}

impl fmt::Display for HslColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hsl({}, {}%, {}%)",
            self.hue, self.saturation, self.lightness
        )
    }
}

impl Serialize for HslColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Rolling 32-bit hash over the UTF-16 code units, `hash * 31 + unit` with
/// signed wraparound. Kept bit-compatible with the browser client so colors
/// stay the same across both front ends.
fn identity_hash(identity: &str) -> i32 {
    identity
        .encode_utf16()
        .fold(0i32, |hash, unit| hash.wrapping_mul(31).wrapping_add(unit as i32))
}

/// Deterministic color for an identity string. Collisions are accepted.
pub fn color_for(identity: &str) -> HslColor {
    let hue = (identity_hash(identity) % 360).unsigned_abs() as u16;
    HslColor {
        hue,
        saturation: SATURATION,
        lightness: LIGHTNESS,
    }
}

/// Colors of the employees fetched for the current session, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct EmployeeColorMap {
    colors: HashMap<String, HslColor>,
}

impl EmployeeColorMap {
    pub fn from_employees(employees: &[Employee]) -> Self {
        let colors = employees
            .iter()
            .map(|e| (e.id.clone(), color_for(e.color_identity())))
            .collect();
        Self { colors }
    }

    /// `None` for ids that are not part of the fetched employee list.
    pub fn get(&self, employee_id: &str) -> Option<HslColor> {
        self.colors.get(employee_id).copied()
    }
}
