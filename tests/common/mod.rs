//! Shared test infrastructure for snmp-collector.
//!
//! Provides module fixtures and pre-populated mock sessions.

#![allow(dead_code)]

use snmp_collector::config::{Index, Lookup, Metric, MetricType, Module, NamedModule};
use snmp_collector::oid;
use snmp_collector::oid::Oid;
use snmp_collector::sample::{label_value, Sample};
use snmp_collector::session::MockSession;
use snmp_collector::Value;

pub fn if_in_octets_oid() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 10)
}

pub fn if_descr_oid() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 2)
}

/// A minimal IF-MIB style module: walk the octet counters, label rows with
/// the interface description.
pub fn if_mib_module() -> Module {
    Module {
        walk: vec![if_descr_oid(), if_in_octets_oid()],
        metrics: vec![
            Metric::new("ifDescr", if_descr_oid(), MetricType::DisplayString)
                .help("Interface description.")
                .index(Index::new("ifIndex", MetricType::Integer32)),
            Metric::new("ifHCInOctets", if_in_octets_oid(), MetricType::Counter)
                .help("Octets received.")
                .index(Index::new("ifIndex", MetricType::Integer32))
                .lookup(Lookup {
                    labelname: "ifDescr".to_string(),
                    oid: if_descr_oid(),
                    lookup_type: MetricType::DisplayString,
                    labels: vec!["ifIndex".to_string()],
                }),
        ],
        ..Module::default()
    }
}

/// A session answering the IF-MIB module with two interfaces.
pub fn if_mib_session() -> MockSession {
    let session = MockSession::new();
    session.insert(if_descr_oid().child(1), "eth0");
    session.insert(if_descr_oid().child(2), "eth1");
    session.insert(if_in_octets_oid().child(1), Value::Counter64(1000));
    session.insert(if_in_octets_oid().child(2), Value::Counter64(2000));
    session
}

pub fn ss_cpu_raw_user_oid() -> Oid {
    oid!(1, 3, 6, 1, 4, 1, 2021, 11, 50, 0)
}

pub fn ss_cpu_raw_idle_oid() -> Oid {
    oid!(1, 3, 6, 1, 4, 1, 2021, 11, 53, 0)
}

pub fn hr_system_date_oid() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 25, 1, 2, 0)
}

/// A module carrying the raw CPU counters and the system date, the minimum
/// the CPU-average derivation needs.
pub fn system_module() -> Module {
    Module {
        get: vec![
            ss_cpu_raw_user_oid(),
            ss_cpu_raw_idle_oid(),
            hr_system_date_oid(),
        ],
        metrics: vec![
            Metric::new(
                "ssCpuRawUser",
                oid!(1, 3, 6, 1, 4, 1, 2021, 11, 50),
                MetricType::Counter,
            ),
            Metric::new(
                "ssCpuRawIdle",
                oid!(1, 3, 6, 1, 4, 1, 2021, 11, 53),
                MetricType::Counter,
            ),
            Metric::new(
                "hrSystemDate",
                oid!(1, 3, 6, 1, 2, 1, 25, 1, 2),
                MetricType::DateAndTime,
            ),
        ],
        ..Module::default()
    }
}

/// RFC 2579 DateAndTime bytes, 8-byte UTC form.
pub fn date_and_time(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Value {
    let [y_hi, y_lo] = year.to_be_bytes();
    Value::from(&[y_hi, y_lo, month, day, hour, minute, second, 0][..])
}

/// Pull every sample matching `name` out of a drained sample list.
pub fn samples_named<'a>(samples: &'a [Sample], name: &str) -> Vec<&'a Sample> {
    samples.iter().filter(|s| s.name() == name).collect()
}

/// The value of the sample with `name` and, optionally, a required label.
pub fn sample_value(samples: &[Sample], name: &str, label: Option<(&str, &str)>) -> Option<f64> {
    samples.iter().find_map(|s| match s {
        Sample::Metric {
            name: n,
            labels,
            value,
            ..
        } if n == name => match label {
            Some((key, expected)) if label_value(labels, key) != Some(expected) => None,
            _ => Some(*value),
        },
        _ => None,
    })
}
