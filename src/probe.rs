use anyhow::{Context, Result};
use async_trait::async_trait;
use hickory_resolver::config::ResolverConfig;
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::TokioResolver;
use std::net::IpAddr;
use std::time::Duration;
use surge_ping::{Client as PingClient, Config as PingConfig, PingIdentifier, PingSequence};
use tracing::debug;

use crate::models::ReachabilityResult;

/// Single-shot reachability probe. Implementations never fail: an
/// unreachable target is a normal `is_up: false` result.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, host: &str, timeout: Duration) -> ReachabilityResult;
}

pub struct IcmpProber {
    ping_client: PingClient,
    dns_resolver: TokioResolver,
}

impl IcmpProber {
    pub fn new() -> Result<Self> {
        let ping_client = PingClient::new(&PingConfig::default())
            .context("Failed to create Ping Client")?;

        let dns_resolver = TokioResolver::builder_with_config(
            ResolverConfig::cloudflare(),
            TokioConnectionProvider::default(),
        )
        .build();

        Ok(Self {
            ping_client,
            dns_resolver,
        })
    }

    async fn resolve(&self, host: &str) -> Result<IpAddr, String> {
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(ip);
        }
        match self.dns_resolver.lookup_ip(host).await {
            Ok(lookup) => lookup.iter().next().ok_or_else(|| "No IP Address Found".into()),
            Err(e) => Err(format!("DNS Resolution Failed: {}", e)),
        }
    }
}

#[async_trait]
impl Prober for IcmpProber {
    async fn probe(&self, host: &str, timeout: Duration) -> ReachabilityResult {
        let ip = match self.resolve(host).await {
            Ok(ip) => ip,
            Err(cause) => {
                debug!("Probe of {} failed before send: {}", host, cause);
                return ReachabilityResult::down(host);
            }
        };

        let payload = [0u8; 56];
        let pinger_id = PingIdentifier(rand::random());
        let mut pinger = self.ping_client.pinger(ip, pinger_id).await;
        pinger.timeout(timeout);

        match pinger.ping(PingSequence(0), &payload).await {
            Ok((_, rtt)) => ReachabilityResult::up(host, rtt),
            Err(e) => {
                debug!("Probe of {} ({}) got no reply: {}", host, ip, e);
                ReachabilityResult::down(host)
            }
        }
    }
}
