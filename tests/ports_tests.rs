use scan_console_rs::ports::parse_port_list;

#[test]
fn parse_single_ports_ranges_and_whitespace() {
    let input = " 22, 80 ,443,8000-8002, 8001 ";

    let ports = parse_port_list(input).expect("parse ok");
    // Dedup, preserve first-appearance order.
    assert_eq!(ports, vec![22, 80, 443, 8000, 8001, 8002]);
}

#[test]
fn invalid_port_rejected() {
    // out of range
    assert!(parse_port_list("0").is_err());
    assert!(parse_port_list("22,65536").is_err());
}
