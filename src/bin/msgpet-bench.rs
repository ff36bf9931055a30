//! msgpet-bench: load-testing client for the msgpet echo server.
//!
//! Opens one connection per simulated client, sends a single random
//! line of the requested size, waits for the echo, and reports
//! success/failure counts and response times. Message sizes can be
//! given as a byte count or as an animal name (`mouse` = 8 bytes up
//! to `whale` = 2048).

use clap::Parser;
use rand::Rng;
use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

/// Command-line arguments for the bench client
#[derive(Parser, Debug)]
#[command(name = "msgpet-bench")]
#[command(version = "0.1.0")]
#[command(about = "Load-testing client for the msgpet echo server", long_about = None)]
struct CliArgs {
    /// Message size: a byte count or an animal name (mouse, chicken,
    /// pig, goat, zebra, rhino, hippo, elephant, whale)
    #[arg(value_parser = parse_size)]
    size: usize,

    /// Server address to connect to
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    addr: String,

    /// Number of client connections to open
    #[arg(short = 'n', long, default_value_t = 10)]
    clients: usize,

    /// Delay between opening connections, in milliseconds
    #[arg(short, long, default_value_t = 0)]
    delay_ms: u64,
}

/// Named message sizes, in bytes.
fn animal_size(name: &str) -> Option<usize> {
    Some(match name {
        "mouse" => 8,
        "chicken" => 16,
        "pig" => 32,
        "goat" => 64,
        "zebra" => 128,
        "rhino" => 256,
        "hippo" => 512,
        "elephant" => 1024,
        "whale" => 2048,
        _ => return None,
    })
}

fn parse_size(arg: &str) -> Result<usize, String> {
    if let Some(size) = animal_size(arg) {
        return Ok(size);
    }
    match arg.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!(
            "expected an animal name or a positive byte count, got '{arg}'"
        )),
    }
}

/// Generate a random printable message of exactly `size` bytes.
/// Printable ASCII only, so the payload can never contain the line
/// delimiter.
fn build_message(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen_range(b'!'..=b'~')).collect()
}

/// Aggregated results of one bench run
#[derive(Debug, Default)]
struct Report {
    successful: u64,
    failed: u64,
    errors: HashMap<String, u64>,
    response_times: Vec<Duration>,
    total: Duration,
}

impl Report {
    fn record(&mut self, outcome: io::Result<Duration>) {
        match outcome {
            Ok(elapsed) => {
                self.successful += 1;
                self.response_times.push(elapsed);
            }
            Err(e) => {
                self.failed += 1;
                *self.errors.entry(e.to_string()).or_insert(0) += 1;
            }
        }
    }

    fn mean_response(&self) -> Option<Duration> {
        let count = u32::try_from(self.response_times.len()).ok()?;
        if count == 0 {
            return None;
        }
        let sum: Duration = self.response_times.iter().sum();
        Some(sum / count)
    }

    fn print(&self) {
        println!("successful requests: {}", self.successful);
        println!("failed requests:     {}", self.failed);
        for (message, count) in &self.errors {
            println!("  {count}x {message}");
        }
        if let Some(mean) = self.mean_response() {
            println!("mean response time:  {mean:?}");
        }
        println!("total time:          {:?}", self.total);
    }
}

/// Send one line and wait for its echo, timing the response.
async fn run_client(addr: &str, message: &[u8]) -> io::Result<Duration> {
    let mut stream = TcpStream::connect(addr).await?;
    stream.write_all(message).await?;
    stream.write_all(b"\n").await?;
    let start = Instant::now();

    let mut reader = BufReader::new(stream);
    let mut response = Vec::with_capacity(message.len() + 1);
    reader.read_until(b'\n', &mut response).await?;
    let elapsed = start.elapsed();

    if response.strip_suffix(b"\n") != Some(message) {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "echo mismatch"));
    }
    Ok(elapsed)
}

async fn run_bench(args: &CliArgs, message: Arc<Vec<u8>>) -> Report {
    let mut report = Report::default();
    let mut handles = Vec::with_capacity(args.clients);
    let start = Instant::now();

    for _ in 0..args.clients {
        let addr = args.addr.clone();
        let message = Arc::clone(&message);
        handles.push(tokio::spawn(
            async move { run_client(&addr, &message).await },
        ));
        if args.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(args.delay_ms)).await;
        }
    }

    for handle in handles {
        match handle.await {
            Ok(outcome) => report.record(outcome),
            Err(e) => report.record(Err(io::Error::other(e))),
        }
    }

    report.total = start.elapsed();
    report
}

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    let message = Arc::new(build_message(args.size));

    println!(
        "sending a {}-byte line to {} over {} connections\n",
        args.size, args.addr, args.clients
    );

    let report = run_bench(&args, message).await;
    report.print();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_animal_sizes() {
        assert_eq!(animal_size("mouse"), Some(8));
        assert_eq!(animal_size("whale"), Some(2048));
        assert_eq!(animal_size("dragon"), None);
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("elephant"), Ok(1024));
        assert_eq!(parse_size("300"), Ok(300));
        assert!(parse_size("0").is_err());
        assert!(parse_size("-5").is_err());
        assert!(parse_size("dragon").is_err());
    }

    #[test]
    fn test_build_message() {
        let message = build_message(512);
        assert_eq!(message.len(), 512);
        assert!(!message.contains(&b'\n'));
    }

    #[test]
    fn test_mean_response_empty() {
        assert_eq!(Report::default().mean_response(), None);
    }

    #[test]
    fn test_report_aggregation() {
        let mut report = Report::default();
        report.record(Ok(Duration::from_millis(10)));
        report.record(Ok(Duration::from_millis(20)));
        report.record(Err(io::Error::new(
            io::ErrorKind::ConnectionReset,
            "connection reset by peer",
        )));

        assert_eq!(report.successful, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.errors["connection reset by peer"], 1);
        assert_eq!(report.mean_response(), Some(Duration::from_millis(15)));
    }
}
