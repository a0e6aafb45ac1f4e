//! Coordination Cycle - health check, message exchange and status snapshot

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

use super::status::SystemStatus;
use crate::context::CoordinatorContext;
use crate::domain::{CrossPillarMessage, MessageKind, Pillar, SystemActivity};
use crate::driver::Tick;
use crate::events::CoordEvent;
use crate::strategy::ActivityPicker;

/// Most discussions returned by [`CoordinationCycle::recent_discussions`]
pub const DISCUSSION_LIMIT: usize = 20;

/// Most activities returned by [`CoordinationCycle::recent_activities`]
pub const ACTIVITY_LIMIT: usize = 30;

/// Message kind sent to a pillar, from its declared capabilities
pub fn kind_for(target: &Pillar) -> MessageKind {
    if target.has_capability("governance") {
        MessageKind::DaoProposal
    } else if target.has_capability("mining") {
        MessageKind::MiningData
    } else if target.has_capability("discussion") || target.has_capability("chat") {
        MessageKind::Discussion
    } else {
        MessageKind::EcosystemUpdate
    }
}

/// Adjacent pairs of a ring: (p0, p1), (p1, p2), ..., (pn, p0)
fn ring_pairs(pillars: &[Pillar]) -> Vec<(&Pillar, &Pillar)> {
    match pillars.len() {
        0 | 1 => Vec::new(),
        2 => vec![(&pillars[0], &pillars[1])],
        n => (0..n).map(|i| (&pillars[i], &pillars[(i + 1) % n])).collect(),
    }
}

pub struct CoordinationCycle {
    ctx: Arc<CoordinatorContext>,
    picker: Arc<dyn ActivityPicker>,
    busy: AtomicBool,
    running: AtomicBool,
}

struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl CoordinationCycle {
    pub fn new(ctx: Arc<CoordinatorContext>, picker: Arc<dyn ActivityPicker>) -> Self {
        Self {
            ctx,
            picker,
            busy: AtomicBool::new(false),
            running: AtomicBool::new(false),
        }
    }

    pub fn context(&self) -> &Arc<CoordinatorContext> {
        &self.ctx
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Run one coordination tick; `None` if one is already in progress
    pub async fn run_tick(&self) -> Option<SystemStatus> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("CoordinationCycle::run_tick: tick in progress, skipping");
            return None;
        }
        let _busy = BusyGuard(&self.busy);

        let reports = self.ctx.health.check_all().await;
        let changed = reports.iter().filter(|r| r.changed()).count();

        let exchanged = self.exchange_messages();
        self.record_activity();

        let status = self.system_status();
        info!(
            health_score = status.health_score,
            online = status.online_count(),
            changed,
            exchanged,
            "Coordination tick done"
        );
        self.ctx.events.emit(CoordEvent::StatusSnapshot(status.clone()));
        Some(status)
    }

    /// Exchange status messages around the pillar ring; returns how many were delivered
    fn exchange_messages(&self) -> usize {
        let pillars = self.ctx.registry.list();
        let mut delivered = 0;
        for (a, b) in ring_pairs(&pillars) {
            if !a.status.is_online() || !b.status.is_online() {
                debug!(from = %a.name, to = %b.name, "CoordinationCycle: pair not online, skipping");
                continue;
            }
            let kind = kind_for(b);
            let outbound = self.ctx.exchange.send(
                &a.name,
                &b.name,
                kind,
                json!({
                    "summary": format!("{} update for {}", a.name, b.name),
                    "capabilities": a.declared_capabilities,
                }),
            );
            if outbound.is_delivered() {
                delivered += 1;
            }
            let ack = self.ctx.exchange.send(
                &b.name,
                &a.name,
                MessageKind::SystemActivity,
                json!({ "acknowledged": kind.as_str() }),
            );
            if ack.is_delivered() {
                delivered += 1;
            }
        }
        delivered
    }

    fn record_activity(&self) {
        let names: Vec<String> = self.ctx.registry.list().into_iter().map(|p| p.name).collect();
        let Some(template) = self.picker.pick_activity(&names) else {
            return;
        };
        let activity = SystemActivity::new(template.pillar, template.description, template.impact)
            .with_payload(json!({ "online_pillars": self.ctx.registry.online_count() }));
        self.ctx.record_activity(activity);
    }

    /// Current status from live shared state; available before the first tick
    pub fn system_status(&self) -> SystemStatus {
        SystemStatus::from_pillars(
            &self.ctx.registry.list(),
            self.ctx.exchange.count_of_kind(MessageKind::Discussion),
            self.ctx.activity_count(),
        )
    }

    /// The last `n` (at most 20) discussion messages, most recent last
    pub fn recent_discussions(&self, n: usize) -> Vec<CrossPillarMessage> {
        self.ctx
            .exchange
            .recent_of_kind(MessageKind::Discussion, n.min(DISCUSSION_LIMIT))
    }

    /// The last `n` (at most 30) system activities, most recent last
    pub fn recent_activities(&self, n: usize) -> Vec<SystemActivity> {
        self.ctx.recent_activities(n.min(ACTIVITY_LIMIT))
    }
}

#[async_trait]
impl Tick for CoordinationCycle {
    fn name(&self) -> &'static str {
        "coordination"
    }

    async fn tick(&self) {
        self.run_tick().await;
    }

    fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }
}
