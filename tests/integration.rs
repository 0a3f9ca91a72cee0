//! End-to-end integration tests for the filtertest CLI
//!
//! These tests verify the complete harness by:
//! 1. Writing synthetic capture files into a temporary capture root
//! 2. Running the filtertest binary against plans that reference them
//! 3. Checking the verdict lines, the aggregate line and the exit code

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

const FIXTURE_PLAN: &str = "tests/fixtures/0001_plan.ts";

const CLIENT: [u8; 4] = [192, 168, 0, 13];
const TFTP_SERVER: [u8; 4] = [192, 168, 0, 10];
const TELNET_CLIENT: [u8; 4] = [192, 168, 0, 2];
const TELNET_SERVER: [u8; 4] = [192, 168, 0, 1];
const WEB_SERVER: [u8; 4] = [65, 208, 228, 223];

const DLT_EN10MB: u32 = 1;
const DLT_LINUX_SLL: u32 = 113;

/// Test context with a temporary capture root and config file
struct TestContext {
    /// Temporary directory for this test; removed on drop
    temp_dir: tempfile::TempDir,
    /// Path to the filtertest binary
    bin: PathBuf,
    /// Empty config file so the user's own config is never read
    config: PathBuf,
}

impl TestContext {
    fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let config = temp_dir.path().join("config.toml");
        fs::write(&config, "").expect("Failed to write config");
        Self {
            temp_dir,
            bin: PathBuf::from(env!("CARGO_BIN_EXE_filtertest")),
            config,
        }
    }

    fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write the captures referenced by the fixture plan.
    ///
    /// The packet mix reproduces the expected counts of every fixture case.
    fn write_fixture_captures(&self) {
        // 41 HTTP segments with payload plus 2 DNS datagrams
        let mut v4 = Vec::new();
        for i in 0..41u16 {
            v4.push(eth_tcp(CLIENT, WEB_SERVER, 3372, 80, usize::from(i % 7) * 10));
        }
        v4.push(eth_udp(CLIENT, TELNET_SERVER, 1025, 53));
        v4.push(eth_udp(TELNET_SERVER, CLIENT, 53, 1025));
        self.write_pcap("ws/v4.pcap", DLT_EN10MB, &v4);

        // Linux cooked telnet session: 48 to the server, 44 back
        let mut telnet = Vec::new();
        for _ in 0..48 {
            telnet.push(sll(&ipv4_tcp(TELNET_CLIENT, TELNET_SERVER, 1254, 23, 1)));
        }
        for _ in 0..44 {
            telnet.push(sll(&ipv4_tcp(TELNET_SERVER, TELNET_CLIENT, 23, 1254, 1)));
        }
        self.write_pcap("ws/telnet-cooked.pcap", DLT_LINUX_SLL, &telnet);

        // TFTP write: 49 requests/data blocks to port 2087, 51 replies
        let mut tftp = Vec::new();
        for _ in 0..49 {
            tftp.push(eth_udp(CLIENT, TFTP_SERVER, 57509, 2087));
        }
        for _ in 0..51 {
            tftp.push(eth_udp(TFTP_SERVER, CLIENT, 2087, 57509));
        }
        self.write_pcap("ws/tftp_wrq.pcap", DLT_EN10MB, &tftp);

        self.write_pcap("igalia/empty.pcap", DLT_EN10MB, &[]);
    }

    fn write_pcap(&self, rel: &str, dlt: u32, packets: &[Vec<u8>]) -> PathBuf {
        let path = self.root().join(rel);
        fs::create_dir_all(path.parent().unwrap()).expect("Failed to create capture dir");
        fs::write(&path, pcap_file(dlt, packets)).expect("Failed to write capture");
        path
    }

    fn write_plan(&self, text: &str) -> PathBuf {
        let path = self.root().join("plan.ts");
        fs::write(&path, text).expect("Failed to write plan");
        path
    }

    /// Run a filtertest command
    fn run(&self, args: &[&str]) -> CliOutput {
        let output = Command::new(&self.bin)
            .arg("--config")
            .arg(&self.config)
            .args(args)
            .env_remove("RUST_LOG")
            .env("NO_COLOR", "1")
            .output()
            .expect("Failed to run filtertest");

        CliOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            code: output.status.code(),
        }
    }

    fn run_plan(&self, plan: &Path, extra: &[&str]) -> CliOutput {
        let mut args = vec!["run", plan.to_str().unwrap(), self.root().to_str().unwrap()];
        args.extend_from_slice(extra);
        self.run(&args)
    }
}

/// Output from a filtertest command
#[derive(Debug)]
struct CliOutput {
    stdout: String,
    stderr: String,
    code: Option<i32>,
}

impl CliOutput {
    fn lines(&self) -> Vec<&str> {
        self.stdout.lines().collect()
    }
}

fn fixture_plan() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(FIXTURE_PLAN)
}

fn single_case(filter: &str, pcap: &str, expected: u64, enabled: bool) -> String {
    format!(
        "id:1\ndescription:single\nfilter:{}\npcap_file:{}\nexpected_result:{}\nenabled:{}\n",
        filter, pcap, expected, enabled
    )
}

// ============== Packet builders ==============

fn pcap_file(dlt: u32, packets: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&0xa1b2_c3d4u32.to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&4u16.to_le_bytes());
    out.extend_from_slice(&0i32.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&65535u32.to_le_bytes());
    out.extend_from_slice(&dlt.to_le_bytes());
    for (i, pkt) in packets.iter().enumerate() {
        out.extend_from_slice(&(1_700_000_000 + i as u32).to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&(pkt.len() as u32).to_le_bytes());
        out.extend_from_slice(&(pkt.len() as u32).to_le_bytes());
        out.extend_from_slice(pkt);
    }
    out
}

fn ipv4(proto: u8, src: [u8; 4], dst: [u8; 4], payload: &[u8]) -> Vec<u8> {
    let total = (20 + payload.len()) as u16;
    let mut p = vec![0x45, 0x00];
    p.extend_from_slice(&total.to_be_bytes());
    p.extend_from_slice(&[0x12, 0x34, 0x40, 0x00, 64, proto, 0x00, 0x00]);
    p.extend_from_slice(&src);
    p.extend_from_slice(&dst);
    p.extend_from_slice(payload);
    p
}

fn ipv4_tcp(src: [u8; 4], dst: [u8; 4], sport: u16, dport: u16, payload: usize) -> Vec<u8> {
    let mut seg = Vec::new();
    seg.extend_from_slice(&sport.to_be_bytes());
    seg.extend_from_slice(&dport.to_be_bytes());
    seg.extend_from_slice(&[0, 0, 0, 1, 0, 0, 0, 1]);
    seg.extend_from_slice(&[0x50, 0x18, 0xff, 0xff, 0, 0, 0, 0]);
    seg.extend(std::iter::repeat(b'x').take(payload));
    ipv4(6, src, dst, &seg)
}

fn ipv4_udp(src: [u8; 4], dst: [u8; 4], sport: u16, dport: u16) -> Vec<u8> {
    let mut dgram = Vec::new();
    dgram.extend_from_slice(&sport.to_be_bytes());
    dgram.extend_from_slice(&dport.to_be_bytes());
    dgram.extend_from_slice(&20u16.to_be_bytes());
    dgram.extend_from_slice(&[0, 0]);
    dgram.extend_from_slice(&[0u8; 12]);
    ipv4(17, src, dst, &dgram)
}

fn ethernet(payload: &[u8]) -> Vec<u8> {
    let mut f = vec![0x00, 0x0c, 0x29, 0x01, 0x02, 0x03, 0x00, 0x50, 0x56, 0x0a, 0x0b, 0x0c];
    f.extend_from_slice(&[0x08, 0x00]);
    f.extend_from_slice(payload);
    f
}

fn sll(payload: &[u8]) -> Vec<u8> {
    let mut f = vec![0x00, 0x00, 0x00, 0x01, 0x00, 0x06];
    f.extend_from_slice(&[0x00, 0x50, 0x56, 0x0a, 0x0b, 0x0c, 0x00, 0x00]);
    f.extend_from_slice(&[0x08, 0x00]);
    f.extend_from_slice(payload);
    f
}

fn eth_tcp(src: [u8; 4], dst: [u8; 4], sport: u16, dport: u16, payload: usize) -> Vec<u8> {
    ethernet(&ipv4_tcp(src, dst, sport, dport, payload))
}

fn eth_udp(src: [u8; 4], dst: [u8; 4], sport: u16, dport: u16) -> Vec<u8> {
    ethernet(&ipv4_udp(src, dst, sport, dport))
}

// ============== Tests ==============

#[test]
fn test_fixture_plan_passes() {
    let ctx = TestContext::new();
    ctx.write_fixture_captures();

    let output = ctx.run_plan(&fixture_plan(), &[]);
    assert_eq!(output.code, Some(0), "stderr: {}", output.stderr);

    let lines = output.lines();
    assert_eq!(lines.len(), 12, "stdout: {}", output.stdout);
    for (i, line) in lines[..11].iter().enumerate() {
        assert_eq!(*line, format!("tc id {} PASS", i + 1));
    }
    assert_eq!(lines[11], "11 cases: 11 passed, 0 failed, 0 skipped");
}

#[test]
fn test_parallel_run_matches_sequential() {
    let ctx = TestContext::new();
    ctx.write_fixture_captures();

    let sequential = ctx.run_plan(&fixture_plan(), &[]);
    let parallel = ctx.run_plan(&fixture_plan(), &["--jobs", "4"]);
    assert_eq!(sequential.stdout, parallel.stdout);
    assert_eq!(parallel.code, Some(0));
}

#[test]
fn test_count_mismatch_fails() {
    let ctx = TestContext::new();
    ctx.write_fixture_captures();
    let plan = ctx.write_plan(&single_case("tcp", "ws/v4.pcap", 40, true));

    let output = ctx.run_plan(&plan, &[]);
    assert_eq!(output.code, Some(1));
    assert_eq!(output.lines()[0], "tc id 1 FAIL (41 != 40)");
    assert_eq!(output.lines()[1], "1 cases: 0 passed, 1 failed, 0 skipped");
}

#[test]
fn test_net_mask_without_matches() {
    let ctx = TestContext::new();
    ctx.write_fixture_captures();
    let plan = ctx.write_plan(&single_case(
        "net 192.168.50.0 mask 255.255.255.0",
        "ws/telnet-cooked.pcap",
        0,
        true,
    ));

    let output = ctx.run_plan(&plan, &[]);
    assert_eq!(output.code, Some(0), "stdout: {}", output.stdout);
    assert_eq!(output.lines()[0], "tc id 1 PASS");
}

#[test]
fn test_disabled_case_with_missing_capture_is_skipped() {
    let ctx = TestContext::new();
    let plan = ctx.write_plan(&single_case("tcp", "does/not/exist.pcap", 5, false));

    let output = ctx.run_plan(&plan, &[]);
    assert_eq!(output.code, Some(0), "stderr: {}", output.stderr);
    assert_eq!(output.lines()[0], "tc id 1 SKIP");
    assert_eq!(output.lines()[1], "1 cases: 0 passed, 0 failed, 1 skipped");
}

#[test]
fn test_missing_capture_fails_case() {
    let ctx = TestContext::new();
    let plan = ctx.write_plan(&single_case("", "does/not/exist.pcap", 0, true));

    let output = ctx.run_plan(&plan, &[]);
    assert_eq!(output.code, Some(1));
    assert!(
        output.lines()[0].starts_with("tc id 1 FAIL (capture read error: "),
        "stdout: {}",
        output.stdout
    );
}

#[test]
fn test_compile_error_fails_case() {
    let ctx = TestContext::new();
    ctx.write_fixture_captures();
    let plan = ctx.write_plan(&single_case("tcp and", "ws/v4.pcap", 0, true));

    let output = ctx.run_plan(&plan, &[]);
    assert_eq!(output.code, Some(1));
    assert!(
        output.lines()[0].starts_with("tc id 1 FAIL (compile error: "),
        "stdout: {}",
        output.stdout
    );
}

#[test]
fn test_deeply_nested_filter_does_not_hide_later_cases() {
    let ctx = TestContext::new();
    ctx.write_fixture_captures();
    let deep = format!("{}tcp{}", "(".repeat(500), ")".repeat(500));
    let second = single_case("tcp", "ws/v4.pcap", 41, true).replacen("id:1", "id:2", 1);
    let plan = ctx.write_plan(&format!("{}\n{}", single_case(&deep, "ws/v4.pcap", 0, true), second));

    let output = ctx.run_plan(&plan, &[]);
    assert_eq!(output.code, Some(1), "stderr: {}", output.stderr);
    let lines = output.lines();
    assert_eq!(lines.len(), 3, "stdout: {}", output.stdout);
    assert!(
        lines[0].starts_with("tc id 1 FAIL (compile error: "),
        "stdout: {}",
        output.stdout
    );
    assert!(lines[0].contains("nested too deeply"));
    assert_eq!(lines[1], "tc id 2 PASS");
    assert_eq!(lines[2], "2 cases: 1 passed, 1 failed, 0 skipped");

    let capture = ctx.root().join("ws/v4.pcap");
    let output = ctx.run(&["count", &deep, capture.to_str().unwrap()]);
    assert_eq!(output.code, Some(1));
    assert!(output.stderr.contains("nested too deeply"), "stderr: {}", output.stderr);
}

#[test]
fn test_log_file_written_on_failing_run() {
    let ctx = TestContext::new();
    let plan = ctx.write_plan(&single_case("", "does/not/exist.pcap", 0, true));
    let log = ctx.root().join("logs/filtertest.log");

    let output = ctx.run_plan(&plan, &["--log-file", log.to_str().unwrap()]);
    assert_eq!(output.code, Some(1));
    let contents = fs::read_to_string(&log).expect("log file missing");
    assert!(contents.contains("case failed"), "log: {}", contents);
}

#[test]
fn test_malformed_plan_prints_no_verdicts() {
    let ctx = TestContext::new();
    ctx.write_fixture_captures();
    let plan = ctx.write_plan(
        "id:1\ndescription:tcp\nfilter:tcp\npcap_file:ws/v4.pcap\nexpected_result:41\nenabled:maybe\n",
    );

    let output = ctx.run_plan(&plan, &[]);
    assert_eq!(output.code, Some(1));
    assert!(!output.stdout.contains("tc id"), "stdout: {}", output.stdout);
    assert!(
        output.stderr.contains("malformed plan at line 6"),
        "stderr: {}",
        output.stderr
    );
}

#[test]
fn test_duplicate_id_rejected() {
    let ctx = TestContext::new();
    let case = single_case("", "a.pcap", 0, true);
    let plan = ctx.write_plan(&format!("{}\n{}", case, case));

    let output = ctx.run(&["check", plan.to_str().unwrap()]);
    assert_eq!(output.code, Some(1));
    assert!(output.stderr.contains("malformed plan"), "stderr: {}", output.stderr);
}

#[test]
fn test_only_selects_cases() {
    let ctx = TestContext::new();
    ctx.write_fixture_captures();

    let output = ctx.run_plan(&fixture_plan(), &["--only", "3", "--only", "7"]);
    assert_eq!(output.code, Some(0));
    let lines = output.lines();
    assert_eq!(lines[2], "tc id 3 PASS");
    assert_eq!(lines[6], "tc id 7 PASS");
    assert_eq!(lines[0], "tc id 1 SKIP");
    assert_eq!(lines[11], "11 cases: 2 passed, 0 failed, 9 skipped");
}

#[test]
fn test_json_report() {
    let ctx = TestContext::new();
    ctx.write_fixture_captures();

    let output = ctx.run_plan(&fixture_plan(), &["--format", "json"]);
    assert_eq!(output.code, Some(0));
    let report: serde_json::Value =
        serde_json::from_str(&output.stdout).expect("stdout is not JSON");
    assert_eq!(report["total"], 11);
    assert_eq!(report["pass"], 11);
    assert_eq!(report["verdicts"][2]["case_id"], 3);
    assert_eq!(report["verdicts"][2]["actual_count"], 41);
}

#[test]
fn test_check_fixture_plan() {
    let ctx = TestContext::new();
    let output = ctx.run(&["check", fixture_plan().to_str().unwrap()]);
    assert_eq!(output.code, Some(0));
    assert_eq!(output.stdout.trim(), "11 cases (11 enabled)");
}

#[test]
fn test_list_fixture_plan() {
    let ctx = TestContext::new();
    let output = ctx.run(&["list", fixture_plan().to_str().unwrap()]);
    assert_eq!(output.code, Some(0));
    let lines = output.lines();
    assert_eq!(lines.len(), 11);
    assert_eq!(lines[2], "3\ttrue\ttcp\tws/v4.pcap");
    assert_eq!(lines[0], "1\ttrue\t\tws/v4.pcap");
}

#[test]
fn test_count_command() {
    let ctx = TestContext::new();
    ctx.write_fixture_captures();
    let capture = ctx.root().join("ws/tftp_wrq.pcap");

    let output = ctx.run(&["count", "udp dst port 2087", capture.to_str().unwrap()]);
    assert_eq!(output.code, Some(0), "stderr: {}", output.stderr);
    assert_eq!(output.stdout.trim(), "49");

    let output = ctx.run(&["count", "tcp[", capture.to_str().unwrap()]);
    assert_eq!(output.code, Some(1));
    assert!(output.stderr.contains("compile error"));
}

#[test]
fn test_capture_root_from_config() {
    let ctx = TestContext::new();
    ctx.write_fixture_captures();
    fs::write(
        &ctx.config,
        format!("[run]\ncapture_root = {:?}\n", ctx.root().to_str().unwrap()),
    )
    .unwrap();

    let output = ctx.run(&["run", fixture_plan().to_str().unwrap()]);
    assert_eq!(output.code, Some(0), "stderr: {}", output.stderr);
    assert!(output.stdout.ends_with("11 cases: 11 passed, 0 failed, 0 skipped\n"));
}

#[test]
fn test_missing_capture_root() {
    let ctx = TestContext::new();
    let output = ctx.run(&["run", fixture_plan().to_str().unwrap()]);
    assert_eq!(output.code, Some(1));
    assert!(output.stderr.starts_with("Error: "), "stderr: {}", output.stderr);
}
