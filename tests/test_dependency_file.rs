use std::io::Write;

use openbach_scenario_builder::error::Error;
use openbach_scenario_builder::loader::dependency_file::{TrafficKind, TrafficParameters, parse_dependency_file, parse_dependency_str};

const TRAFFICS: &str = "\
# id kind src dst duration wait_launched wait_finished delay src_ip dst_ip extra
1 iperf3 client server 30 None None 0 192.168.1.1 192.168.2.1 5201 500M 0 1400
2 voip client server 30 1 None 5 192.168.1.1 192.168.2.1 8010 G.711.1

3 web client server 20 None 1-2 0 192.168.1.1 192.168.2.1 2 1
4 dash client server 20 None 3 0 192.168.1.1 192.168.2.1 http/2 5301
";

#[test]
fn test_valid_file_is_fully_accepted() {
    let parsed = parse_dependency_str(TRAFFICS);

    assert!(parsed.rejected.is_empty());
    let kinds: Vec<TrafficKind> = parsed.records.iter().map(|r| r.kind()).collect();
    assert_eq!(kinds, vec![TrafficKind::DataTransfer, TrafficKind::Voip, TrafficKind::WebBrowsing, TrafficKind::Dash]);

    let web = &parsed.records[2];
    assert_eq!(web.wait_finished, vec![1, 2]);
    assert_eq!(web.parameters, TrafficParameters::WebBrowsing { nb_runs: 2, nb_parallel_runs: 1 });
    assert_eq!(parsed.records[1].delay, 5);
    assert_eq!(
        parsed.records[0].parameters,
        TrafficParameters::DataTransfer { port: 5201, size: "500M".to_string(), tos: 0, mtu: 1400 }
    );
}

#[test]
fn test_broken_lines_are_skipped() {
    let content = "\
1 voip a b 30 None None 0 10.0.0.1 10.0.0.2 8010 G.711.1
1 voip a b 30 None None 0 10.0.0.1 10.0.0.2 8011 G.711.1
2 voip a b 30 None None 0 10.0.0.1 10.0.0.2 8010
3 ftp a b 30 None None 0 10.0.0.1 10.0.0.2 21 x
4 voip a b thirty None None 0 10.0.0.1 10.0.0.2 8010 G.711.1
5 voip a b 30 6 None 0 10.0.0.1 10.0.0.2 8010 G.711.1
6 voip a b 30 None 2 0 10.0.0.1 10.0.0.2 8010 G.711.1
7 voip a b 30 None 1 0 10.0.0.1 10.0.0.2 8010 G.711.1
";
    let parsed = parse_dependency_str(content);

    let accepted: Vec<u32> = parsed.records.iter().map(|r| r.id).collect();
    assert_eq!(accepted, vec![1, 7]);

    let lines: Vec<usize> = parsed.rejected.iter().map(|r| r.line).collect();
    assert_eq!(lines, vec![2, 3, 4, 5, 6, 7]);
    assert!(matches!(parsed.rejected[0].error, Error::DuplicateId(1)));
    assert!(matches!(parsed.rejected[1].error, Error::MalformedRecord { line: 3, .. }));
    assert!(matches!(parsed.rejected[2].error, Error::MalformedRecord { .. }));
    assert!(matches!(parsed.rejected[3].error, Error::MalformedRecord { .. }));
    assert!(matches!(parsed.rejected[4].error, Error::ForwardReference { id: 5, dependency: 6 }));
    assert!(matches!(parsed.rejected[5].error, Error::ForwardReference { id: 6, dependency: 2 }));
}

#[test]
fn test_parse_from_disk() {
    let path = std::env::temp_dir().join(format!("traffics-{}.txt", std::process::id()));
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(TRAFFICS.as_bytes()).unwrap();

    let parsed = parse_dependency_file(path.to_str().unwrap()).unwrap();
    assert_eq!(parsed.records.len(), 4);
    std::fs::remove_file(&path).unwrap();

    assert!(matches!(parse_dependency_file("/nonexistent/traffics.txt"), Err(Error::IoError(_))));
}
