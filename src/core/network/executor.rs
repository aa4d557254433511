//! Probe executor
//!
//! Walks the configured groups in fixed order (Direct, Proxy, VPN), hands
//! each endpoint to the matching checker and collects one probe per checked
//! endpoint. Under [`ExecutionPolicy::Optimized`] the Direct and VPN groups
//! are gated on ICMP: when no echo reply comes back, the group's remaining
//! endpoints are skipped without emitting probes. The Proxy group always runs
//! in full, since a proxy path is not expected to answer ping.

use super::analyzer::analyze;
use super::checkers::Checkers;
use super::context::ProbeContext;
use super::debug_logger::DebugLogger;
use super::endpoint::{Endpoint, TargetKind};
use super::types::{ConnectivityResult, ExecutionPolicy, Probe};
use crate::config::{EndpointGroup, NetTestConfig};

pub struct Executor {
    checkers: Checkers,
    policy: ExecutionPolicy,
    logger: DebugLogger,
}

impl Executor {
    pub fn new(checkers: Checkers, policy: ExecutionPolicy) -> Self {
        Self {
            checkers,
            policy,
            logger: DebugLogger::new(),
        }
    }

    pub fn with_logger(mut self, logger: DebugLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn policy(&self) -> ExecutionPolicy {
        self.policy
    }

    /// Check every group and classify the outcome
    pub async fn run(&self, ctx: &ProbeContext, config: &NetTestConfig) -> ConnectivityResult {
        let mut probes = Vec::with_capacity(config.len());

        for group in EndpointGroup::ORDER {
            let endpoints = config.endpoints(group);
            let gated = self.policy == ExecutionPolicy::Optimized && group != EndpointGroup::Proxy;

            if gated {
                self.run_optimized(ctx, group, endpoints, config, &mut probes).await;
            } else {
                self.run_all(ctx, group, endpoints.iter(), config, &mut probes).await;
            }
        }

        let result = analyze(probes);
        self.logger.analysis_complete(&result);
        result
    }

    async fn run_optimized(
        &self,
        ctx: &ProbeContext,
        group: EndpointGroup,
        endpoints: &[Endpoint],
        config: &NetTestConfig,
        probes: &mut Vec<Probe>,
    ) {
        let (icmp, others): (Vec<&Endpoint>, Vec<&Endpoint>) = endpoints
            .iter()
            .partition(|ep| ep.kind() == TargetKind::Icmp);

        if icmp.is_empty() {
            self.run_all(ctx, group, others.into_iter(), config, probes).await;
            return;
        }

        let before = probes.len();
        self.run_all(ctx, group, icmp.into_iter(), config, probes).await;
        let reachable = probes[before..].iter().any(Probe::is_successful);

        if reachable {
            self.run_all(ctx, group, others.into_iter(), config, probes).await;
        } else if !others.is_empty() {
            self.logger.group_skipped(&group.to_string(), self.policy, others.len());
        }
    }

    async fn run_all<'a>(
        &self,
        ctx: &ProbeContext,
        group: EndpointGroup,
        endpoints: impl Iterator<Item = &'a Endpoint>,
        config: &NetTestConfig,
        probes: &mut Vec<Probe>,
    ) {
        let group_name = group.to_string();
        for endpoint in endpoints {
            self.logger.probe_start(&group_name, endpoint);
            let probe = self.check_endpoint(ctx, endpoint, config).await;
            self.logger.probe_end(&group_name, &probe);
            probes.push(probe);
        }
    }

    async fn check_endpoint(
        &self,
        ctx: &ProbeContext,
        endpoint: &Endpoint,
        config: &NetTestConfig,
    ) -> Probe {
        match endpoint.kind() {
            TargetKind::Icmp => self.checkers.icmp.check_ping(ctx, endpoint).await,
            TargetKind::Tcp => self.checkers.tcp.check(ctx, endpoint).await,
            TargetKind::Dns => self.checkers.dns.check(ctx, endpoint).await,
            TargetKind::Http if endpoint.requires_proxy() => {
                let proxy_url = if endpoint.proxy_url().is_empty() {
                    config.proxy_url()
                } else {
                    endpoint.proxy_url()
                };
                self.checkers.http.check_via_proxy(ctx, endpoint, proxy_url).await
            }
            TargetKind::Http => self.checkers.http.check(ctx, endpoint).await,
        }
    }
}
