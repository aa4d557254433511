//! Reduction of a probe list into one connectivity mode
//!
//! Priority is Direct > ViaProxy > ViaVpn > None. Direct additionally
//! requires a passing DNS probe, but only when the run contained DNS probes
//! at all; a configuration without DNS checks is judged on TCP/ICMP alone.

use super::endpoint::{EndpointClass, TargetKind};
use super::types::{ConnectivityMode, ConnectivityResult, Probe};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct PathEvidence {
    dns_checked: bool,
    dns_ok: bool,
    direct_ok: bool,
    proxy_ok: bool,
    vpn_ok: bool,
}

impl PathEvidence {
    fn collect(probes: &[Probe]) -> Self {
        let mut evidence = Self::default();

        for probe in probes {
            let endpoint = probe.endpoint();
            if endpoint.kind() == TargetKind::Dns {
                evidence.dns_checked = true;
            }
            if !probe.is_successful() {
                continue;
            }

            if endpoint.kind() == TargetKind::Dns {
                evidence.dns_ok = true;
            }
            match endpoint.class() {
                EndpointClass::Vpn => evidence.vpn_ok = true,
                EndpointClass::Public => {
                    if endpoint.is_direct_type() {
                        evidence.direct_ok = true;
                    }
                    if endpoint.requires_proxy() {
                        evidence.proxy_ok = true;
                    }
                }
            }
        }

        evidence
    }

    fn mode(&self) -> ConnectivityMode {
        if self.direct_ok && (self.dns_ok || !self.dns_checked) {
            ConnectivityMode::Direct
        } else if self.proxy_ok {
            ConnectivityMode::ViaProxy
        } else if self.vpn_ok {
            ConnectivityMode::ViaVpn
        } else {
            ConnectivityMode::None
        }
    }
}

/// Classify a run. Probe order is preserved in the result.
pub fn analyze(probes: Vec<Probe>) -> ConnectivityResult {
    let mode = PathEvidence::collect(&probes).mode();
    ConnectivityResult::new(mode, probes)
}
