// Procstat -- per-process telemetry agent for Linux
// Copyright (C) 2026  Procstat authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use getset::{CopyGetters, Getters};
use serde::Serialize;
use strum::IntoStaticStr;

/// Unit of an observed value.
#[derive(Copy, Clone, Debug, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum Unit {
    Count,
    Percentage,
}

/// Class of metrics produced by one sampler.
#[derive(Copy, Clone, Debug, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum MetricClass {
    Cpu,
    Net,
    Mem,
    Disk,
}

/// Numeric metric value, serialized as a bare JSON number.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Integer(i64),
    Float(f64),
}

impl From<i64> for MetricValue {
    fn from(value: i64) -> Self {
        MetricValue::Integer(value)
    }
}

impl From<u64> for MetricValue {
    fn from(value: u64) -> Self {
        MetricValue::Integer(value as i64)
    }
}

impl From<f64> for MetricValue {
    fn from(value: f64) -> Self {
        MetricValue::Float(value)
    }
}

/// One observed value. Immutable once created.
#[derive(Clone, Debug, CopyGetters)]
pub struct MetricPoint {
    #[getset(get_copy = "pub")]
    unit: Unit,
    #[getset(get_copy = "pub")]
    name: &'static str,
    #[getset(get_copy = "pub")]
    value: MetricValue,
    #[getset(get_copy = "pub")]
    namespace: Option<&'static str>,
}

impl MetricPoint {
    pub fn new<V>(unit: Unit, name: &'static str, value: V, namespace: Option<&'static str>) -> Self
    where
        V: Into<MetricValue>,
    {
        MetricPoint {
            unit,
            name,
            value: value.into(),
            namespace,
        }
    }

    /// Fully-qualified key of the point within a class.
    ///
    /// The namespace segment and its separator are omitted together when the
    /// point has no namespace.
    pub fn key(&self, class: MetricClass) -> String {
        let class: &'static str = class.into();
        let unit: &'static str = self.unit.into();
        match self.namespace {
            Some(namespace) => format!("Component/{}/{}/{}[{}]", class, namespace, self.name, unit),
            None => format!("Component/{}/{}[{}]", class, self.name, unit),
        }
    }
}

/// Metric points produced by one sampler for one process during one cycle.
#[derive(Debug, Getters, CopyGetters)]
pub struct MetricGroup {
    #[getset(get_copy = "pub")]
    class: MetricClass,
    #[getset(get = "pub")]
    points: Vec<MetricPoint>,
}

impl MetricGroup {
    pub fn new(class: MetricClass) -> Self {
        MetricGroup {
            class,
            points: Vec::new(),
        }
    }

    pub fn push<V>(
        &mut self,
        unit: Unit,
        name: &'static str,
        value: V,
        namespace: Option<&'static str>,
    ) where
        V: Into<MetricValue>,
    {
        self.points
            .push(MetricPoint::new(unit, name, value, namespace));
    }
}
