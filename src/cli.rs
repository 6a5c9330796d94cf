use clap::Parser;
use std::path::PathBuf;

/// Fast reconnaissance web spider
#[derive(Parser, Debug)]
#[command(name = "skitter")]
#[command(about = "Crawl a site or apex domain and mine URLs, JS endpoints, forms, subdomains and S3 buckets")]
#[command(version)]
#[command(after_help = "\
Examples:
  skitter -q -s \"https://target.example/\"
  skitter -s \"https://target.example/\" -o output -c 10 -d 1
  skitter -s target.example                # auto-scope to apex + subdomains
  skitter -s target.example --types href   # emit only [href]
  echo target.example | skitter -o output -c 10 -d 1 --other-source
  skitter -s target.example --render       # headless pass (budget 6, 8s/page)")]
pub struct Cli {
    /// Site or bare domain to crawl (e.g. https://example.com or example.com)
    #[arg(short = 's', long)]
    pub site: Option<String>,

    /// File of sites/domains to crawl, one per line
    #[arg(short = 'S', long)]
    pub sites: Option<PathBuf>,

    /// Proxy for all requests (e.g. http://127.0.0.1:8080)
    #[arg(short = 'p', long)]
    pub proxy: Option<String>,

    /// Output folder; one file per target, hostname dots become underscores
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// User agent: web (random desktop), mobi (random mobile), or a literal string
    #[arg(short = 'u', long, default_value = "web")]
    pub user_agent: String,

    /// Cookie header to send (testA=a; testB=b)
    #[arg(long)]
    pub cookie: Option<String>,

    /// Extra header KEY:VALUE; repeat for multiple headers
    #[arg(short = 'H', long = "header")]
    pub header: Vec<String>,

    /// Load headers and cookie from a saved raw HTTP request
    #[arg(long)]
    pub burp: Option<PathBuf>,

    /// Blacklist URL regex; matching URLs are never visited
    #[arg(long)]
    pub blacklist: Option<String>,

    /// Whitelist URL regex; replaces the automatic scope
    #[arg(long)]
    pub whitelist: Option<String>,

    /// Whitelist a single domain; replaces the automatic scope
    #[arg(long)]
    pub whitelist_domain: Option<String>,

    /// Suppress [url] output for responses whose body length is in this CSV
    #[arg(short = 'L', long, default_value = "")]
    pub filter_length: String,

    /// Number of targets to crawl in parallel
    #[arg(short = 't', long, default_value_t = 1)]
    pub threads: usize,

    /// Max concurrent requests per target
    #[arg(short = 'c', long, default_value_t = 5)]
    pub concurrent: usize,

    /// Max crawl depth (0 = infinite)
    #[arg(short = 'd', long, default_value_t = 1)]
    pub depth: u32,

    /// Fixed delay between requests, in seconds
    #[arg(short = 'k', long, default_value_t = 0)]
    pub delay: u64,

    /// Extra random delay between requests, 0..=N seconds
    #[arg(short = 'K', long, default_value_t = 0)]
    pub random_delay: u64,

    /// Request timeout in seconds (0 falls back to 10)
    #[arg(short = 'm', long, default_value_t = 10)]
    pub timeout: u64,

    /// Plain HTML crawling only: disables robots, sitemap, JS link-finder and
    /// third-party sources
    #[arg(short = 'B', long)]
    pub base: bool,

    /// Disable the link-finder pass over JavaScript files
    #[arg(long)]
    pub no_js: bool,

    /// Probe well-known sitemap.xml paths
    #[arg(long)]
    pub sitemap: bool,

    /// Disable the robots.txt probe
    #[arg(long)]
    pub no_robots: bool,

    /// Pull URLs from third-party archives (Wayback, CommonCrawl, VirusTotal, OTX)
    #[arg(short = 'a', long)]
    pub other_source: bool,

    /// Include subdomains when querying third-party archives
    #[arg(short = 'w', long)]
    pub include_subs: bool,

    /// Also print third-party archive URLs (they are crawled either way)
    #[arg(short = 'r', long)]
    pub include_other_source: bool,

    /// Include subdomains in scope (full-URL targets only; bare domains
    /// auto-enable this)
    #[arg(long)]
    pub subs: bool,

    /// Debug logging
    #[arg(long)]
    pub debug: bool,

    /// One JSON object per line instead of plain text
    #[arg(long)]
    pub json: bool,

    /// Verbose logs
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Only print discovered URLs
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Stop following redirects that leave the target scope
    #[arg(long)]
    pub no_redirect: bool,

    /// Print response body lengths with [url] records
    #[arg(short = 'l', long)]
    pub length: bool,

    /// Print raw bodies of visited responses
    #[arg(short = 'R', long)]
    pub raw: bool,

    /// Enable the selective headless render pass
    #[arg(long)]
    pub render: bool,

    /// Max rendered pages per target
    #[arg(long, default_value_t = 6)]
    pub render_budget: usize,

    /// Seconds per rendered page
    #[arg(long, default_value_t = 8)]
    pub render_timeout: u64,

    /// CSV allowlist of kinds to emit (href,url,javascript,linkfinder,form,
    /// upload-form,robots,sitemap,subdomains,aws,render,network). Empty = all
    #[arg(long, default_value = "")]
    pub types: String,

    /// CSV denylist of kinds to suppress; applied after --types
    #[arg(long, default_value = "")]
    pub exclude_types: String,
}
