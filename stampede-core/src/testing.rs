//! Test fixtures for load-generator reports

/// A complete report as printed by httperf for a 10000 connection run
pub const SAMPLE_REPORT: &str = "Maximum connect burst length: 1

Total: connections 10000 requests 10000 replies 10000 test-duration 6.964 s

Connection rate: 1435.9 conn/s (0.7 ms/conn, <=1 concurrent connections)
Connection time [ms]: min 0.2 avg 0.7 max 27.4 median 0.5 stddev 0.7
Connection time [ms]: connect 0.1
Connection length [replies/conn]: 1.000

Request rate: 1435.9 req/s (0.7 ms/req)
Request size [B]: 72.0

Reply rate [replies/s]: min 1444.8 avg 1444.8 max 1444.8 stddev 0.0 (1 samples)
Reply time [ms]: response 0.5 transfer 0.1
Reply size [B]: header 170.0 content 4109.0 footer 2.0 (total 4281.0)
Reply status: 1xx=0 2xx=10000 3xx=0 4xx=0 5xx=0

CPU time [s]: user 1.28 system 5.22 (user 18.4% system 75.0% total 93.5%)
Net I/O: 6101.1 KB/s (50.0*10^6 bps)

Errors: total 0 client-timo 0 socket-timo 0 connrefused 0 connreset 0
Errors: fd-unavail 0 addrunavail 0 ftab-full 0 other 0
";

/// Builds syntactically valid reports with chosen values.
///
/// The error total is always the sum of the individual counters, as it is
/// in real output.
#[derive(Debug, Clone)]
pub struct ReportBuilder {
    connections: u64,
    replies: Option<u64>,
    duration: f64,
    connection_rate: f64,
    samples: u64,
    client_timeouts: u64,
    socket_timeouts: u64,
    connection_refused: u64,
    connection_reset: u64,
    addr_unavail: u64,
    other_errors: u64,
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self {
            connections: 10000,
            replies: None,
            duration: 6.964,
            connection_rate: 1435.9,
            samples: 1,
            client_timeouts: 0,
            socket_timeouts: 0,
            connection_refused: 0,
            connection_reset: 0,
            addr_unavail: 0,
            other_errors: 0,
        }
    }

    pub fn connections(mut self, connections: u64) -> Self {
        self.connections = connections;
        self
    }

    pub fn replies(mut self, replies: u64) -> Self {
        self.replies = Some(replies);
        self
    }

    pub fn duration(mut self, seconds: f64) -> Self {
        self.duration = seconds;
        self
    }

    /// Realised connection rate in conn/s
    pub fn connection_rate(mut self, rate: f64) -> Self {
        self.connection_rate = rate;
        self
    }

    pub fn samples(mut self, samples: u64) -> Self {
        self.samples = samples;
        self
    }

    pub fn client_timeouts(mut self, count: u64) -> Self {
        self.client_timeouts = count;
        self
    }

    pub fn socket_timeouts(mut self, count: u64) -> Self {
        self.socket_timeouts = count;
        self
    }

    pub fn connection_refused(mut self, count: u64) -> Self {
        self.connection_refused = count;
        self
    }

    pub fn connection_reset(mut self, count: u64) -> Self {
        self.connection_reset = count;
        self
    }

    pub fn addr_unavail(mut self, count: u64) -> Self {
        self.addr_unavail = count;
        self
    }

    pub fn other_errors(mut self, count: u64) -> Self {
        self.other_errors = count;
        self
    }

    pub fn build(&self) -> String {
        let total_errors = self.client_timeouts
            + self.socket_timeouts
            + self.connection_refused
            + self.connection_reset
            + self.addr_unavail
            + self.other_errors;
        let replies = self
            .replies
            .unwrap_or_else(|| self.connections.saturating_sub(total_errors));
        let ms_per_conn = if self.connection_rate > 0.0 {
            1000.0 / self.connection_rate
        } else {
            0.0
        };

        format!(
            "Maximum connect burst length: 1\n\
             \n\
             Total: connections {conns} requests {conns} replies {replies} test-duration {duration:.3} s\n\
             \n\
             Connection rate: {rate:.1} conn/s ({ms:.1} ms/conn, <=1 concurrent connections)\n\
             Connection time [ms]: min 0.2 avg 0.7 max 27.4 median 0.5 stddev 0.7\n\
             Connection time [ms]: connect 0.1\n\
             Connection length [replies/conn]: 1.000\n\
             \n\
             Request rate: {rate:.1} req/s ({ms:.1} ms/req)\n\
             Request size [B]: 72.0\n\
             \n\
             Reply rate [replies/s]: min {rate:.1} avg {rate:.1} max {rate:.1} stddev 0.0 ({samples} samples)\n\
             Reply time [ms]: response 0.5 transfer 0.1\n\
             Reply size [B]: header 170.0 content 4109.0 footer 2.0 (total 4281.0)\n\
             Reply status: 1xx=0 2xx={replies} 3xx=0 4xx=0 5xx=0\n\
             \n\
             CPU time [s]: user 1.28 system 5.22 (user 18.4% system 75.0% total 93.5%)\n\
             Net I/O: 6101.1 KB/s (50.0*10^6 bps)\n\
             \n\
             Errors: total {total} client-timo {client} socket-timo {socket} connrefused {refused} connreset {reset}\n\
             Errors: fd-unavail 0 addrunavail {addr} ftab-full 0 other {other}\n",
            conns = self.connections,
            replies = replies,
            duration = self.duration,
            rate = self.connection_rate,
            ms = ms_per_conn,
            samples = self.samples,
            total = total_errors,
            client = self.client_timeouts,
            socket = self.socket_timeouts,
            refused = self.connection_refused,
            reset = self.connection_reset,
            addr = self.addr_unavail,
            other = self.other_errors,
        )
    }
}
