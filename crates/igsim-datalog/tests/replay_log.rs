//! Recorded event logs replayed through listener chains.

use std::fs::File;
use std::io::{BufReader, Cursor};

use igsim_datalog::{
    replay_log, DatalogError, EnvironmentId, IterationAggregator, ListenerChain,
    ReplaySimulation, ReplaySummary, RunHeader, VerboseLogger,
};

const TWO_ITERATIONS: &str = r#"{"kind":"header","params":{"seed":42,"loci":10}}
{"kind":"event","metric":"simulation_start"}
{"kind":"event","metric":"environment_start","payload":{"id":3}}
{"kind":"event","metric":"organism_fitness_difference","payload":0.5}
{"kind":"event","metric":"organism_mutation_beneficial","payload":true}
{"kind":"event","metric":"organism_fitness_difference","payload":-0.2}
{"kind":"event","metric":"organism_mutation_beneficial","payload":false}
{"kind":"population","time":1,"fitness":[0.6,0.8]}
{"kind":"event","metric":"iteration_complete"}

{"kind":"event","metric":"organism_mutation_beneficial","payload":true}
{"kind":"event","metric":"iteration_complete"}
{"kind":"event","metric":"environment_complete"}
"#;

fn replay_aggregate(log: &str) -> (igsim_datalog::Result<ReplaySummary>, String) {
    let mut out = Vec::new();
    let result = {
        let mut chain: ListenerChain<'_, ReplaySimulation> = ListenerChain::new();
        chain.push(IterationAggregator::<EnvironmentId, _>::new(&mut out));
        replay_log(Cursor::new(log), &mut chain)
    };
    (result, String::from_utf8(out).unwrap())
}

#[test]
fn header_then_one_row_per_iteration() {
    let (result, out) = replay_aggregate(TWO_ITERATIONS);
    let summary = result.unwrap();

    assert_eq!(
        summary,
        ReplaySummary {
            lines: 12,
            events: 10,
            iterations: 2,
        }
    );

    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(
        RunHeader::parse(lines[0]),
        RunHeader::new().with_param("loci", 10).with_param("seed", 42)
    );
    assert_eq!(
        lines[1],
        "1,3,2,1.000000,0.700000,0.500000,-0.200000,0.150000"
    );
    assert_eq!(
        lines[2],
        "2,3,1,1000000000.000000,0.700000,0.000000,NaN,0.000000"
    );
}

#[test]
fn log_without_header_still_gets_a_header_line() {
    let log = concat!(
        r#"{"kind":"event","metric":"environment_start","payload":{"id":1}}"#,
        "\n",
        r#"{"kind":"event","metric":"iteration_complete"}"#,
        "\n",
    );
    let (result, out) = replay_aggregate(log);
    assert_eq!(result.unwrap().iterations, 1);

    let mut lines = out.lines();
    assert!(lines.next().unwrap().starts_with("Generation,Environment,"));
    assert_eq!(lines.next().unwrap(), "1,1,0,0.000000,NaN,NaN,NaN,NaN");
}

#[test]
fn late_header_is_ignored() {
    let log = concat!(
        r#"{"kind":"event","metric":"environment_start","payload":{"id":1}}"#,
        "\n",
        r#"{"kind":"header","params":{"seed":1}}"#,
        "\n",
        r#"{"kind":"event","metric":"iteration_complete"}"#,
        "\n",
    );
    let (result, out) = replay_aggregate(log);
    result.unwrap();

    assert_eq!(out.lines().count(), 2);
    assert!(!out.contains("seed=1"));
}

#[test]
fn contract_violation_reports_its_line() {
    let log = concat!(
        r#"{"kind":"event","metric":"environment_start","payload":{"id":1}}"#,
        "\n",
        "\n",
        r#"{"kind":"event","metric":"organism_fitness_difference","payload":true}"#,
        "\n",
    );
    let (result, _) = replay_aggregate(log);

    match result.unwrap_err() {
        DatalogError::Replay { line, source } => {
            assert_eq!(line, 3);
            assert!(matches!(*source, DatalogError::ContractViolation { .. }));
        }
        other => panic!("expected Replay, got {other:?}"),
    }
}

#[test]
fn iteration_before_environment_fails_without_writing_a_row() {
    let log = concat!(
        r#"{"kind":"event","metric":"organism_mutation_beneficial","payload":true}"#,
        "\n",
        r#"{"kind":"event","metric":"iteration_complete"}"#,
        "\n",
    );
    let (result, out) = replay_aggregate(log);

    let err = result.unwrap_err();
    assert!(err.to_string().starts_with("event log line 2: uninitialized state"));
    assert_eq!(out.lines().count(), 1);
}

#[test]
fn malformed_json_and_unknown_metrics_are_rejected() {
    let (result, _) = replay_aggregate("{not json}\n");
    assert!(matches!(
        result.unwrap_err(),
        DatalogError::Replay { line: 1, ref source } if matches!(**source, DatalogError::Decode(_))
    ));

    let (result, _) = replay_aggregate(r#"{"kind":"event","metric":"organism_died"}"#);
    assert!(matches!(
        result.unwrap_err(),
        DatalogError::Replay { line: 1, ref source } if matches!(**source, DatalogError::UnknownMetric(_))
    ));
}

#[test]
fn verbose_mode_tracks_replay_time() {
    let mut out = Vec::new();
    {
        let mut chain: ListenerChain<'_, ReplaySimulation> = ListenerChain::new();
        chain.push(VerboseLogger::new(&mut out));
        let summary = replay_log(Cursor::new(TWO_ITERATIONS), &mut chain).unwrap();
        assert_eq!(summary.iterations, 2);
    }

    let log = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(lines.len(), 10);
    assert_eq!(lines[0], "METRIC: 0 / 2 / ()");
    assert_eq!(lines[1], "METRIC: 0 / 0 / EnvironmentId { id: 3 }");
    assert_eq!(lines[2], "METRIC: 0 / 3 / 0.500000");
    assert_eq!(lines[6], "METRIC: 1 / 5 / ()");
    assert_eq!(lines[7], "METRIC: 2 / 4 / true");
    assert_eq!(lines[9], "METRIC: 3 / 1 / ()");
}

#[test]
fn replay_from_file_into_file() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("run.jsonl");
    let out_path = dir.path().join("datalog.csv");
    std::fs::write(&log_path, TWO_ITERATIONS).unwrap();

    {
        let sink = File::create(&out_path).unwrap();
        let mut chain: ListenerChain<'_, ReplaySimulation> = ListenerChain::new();
        chain.push(IterationAggregator::<EnvironmentId, _>::new(sink));
        let reader = BufReader::new(File::open(&log_path).unwrap());
        replay_log(reader, &mut chain).unwrap();
    }

    let written = std::fs::read_to_string(&out_path).unwrap();
    assert_eq!(written.lines().count(), 3);
    assert!(written.ends_with('\n'));
}

#[test]
fn marker_events_ignore_whatever_payload_they_carry() {
    let log = concat!(
        r#"{"kind":"event","metric":"simulation_start","payload":{"note":"begin"}}"#,
        "\n",
        r#"{"kind":"event","metric":"environment_start","payload":{"id":2}}"#,
        "\n",
        r#"{"kind":"population","fitness":[0.5]}"#,
        "\n",
        r#"{"kind":"event","metric":"iteration_complete","payload":"done"}"#,
        "\n",
        r#"{"kind":"event","metric":"environment_complete","payload":7}"#,
        "\n",
    );
    let (result, out) = replay_aggregate(log);

    let summary = result.unwrap();
    assert_eq!(summary.events, 4);
    assert_eq!(summary.iterations, 1);
    assert_eq!(out.lines().nth(1), Some("1,2,0,0.000000,0.500000,NaN,NaN,NaN"));
}
