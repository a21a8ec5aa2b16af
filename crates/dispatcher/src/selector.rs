use std::sync::Arc;

use metrics::counter;
use tracing::{debug, info};

use lineup_core::DispatchResult;
use lineup_domain::rotation::{compare_candidates, Candidate};
use lineup_domain::{Closer, CloserRepository, LeadRepository};

/// 派发选择器
///
/// 对一个团队选出下一个应接单的closer。逐候选人查询工作量,
/// O(团队人数), 小团队规模下刻意保持简单 — 公平优先于吞吐。
///
/// 工作量查询与最终的指派写入不在一个事务里: 并发创建线索时
/// 两次选择可能命中同一个closer。这是已知并接受的窄竞态窗口,
/// 轮转是公平性启发, 不是强一致分配器。
pub struct DispatchSelector {
    closer_repo: Arc<dyn CloserRepository>,
    lead_repo: Arc<dyn LeadRepository>,
}

impl DispatchSelector {
    pub fn new(closer_repo: Arc<dyn CloserRepository>, lead_repo: Arc<dyn LeadRepository>) -> Self {
        Self {
            closer_repo,
            lead_repo,
        }
    }

    /// 团队当前可接单的候选人, 按比较器排序
    ///
    /// 可接单 = 在班且有效工作量为0; 未核验的预约线索不占名额,
    /// 只挂着这类线索的closer仍留在轮转里
    pub async fn available_candidates(&self, team_id: &str) -> DispatchResult<Vec<Candidate>> {
        let on_duty = self.closer_repo.list_on_duty(team_id).await?;
        let mut candidates = Vec::new();

        for closer in on_duty {
            let live_count = self.lead_repo.live_assignment_count(&closer.id).await?;
            if live_count == 0 {
                candidates.push(Candidate { closer, live_count });
            } else {
                debug!(
                    closer_id = %closer.id,
                    live_count,
                    "closer有在处理的线索, 本轮不参与派发"
                );
            }
        }

        candidates.sort_by(compare_candidates);
        Ok(candidates)
    }

    /// 选出下一个接单者; 无人可用返回 None, 由调用方升级处理
    pub async fn select_next(&self, team_id: &str) -> DispatchResult<Option<Closer>> {
        let candidates = self.available_candidates(team_id).await?;

        match candidates.into_iter().next() {
            Some(candidate) => {
                info!(
                    team_id = team_id,
                    closer_id = %candidate.closer.id,
                    lineup_order = ?candidate.closer.lineup_order,
                    "选出下一个接单closer"
                );
                counter!("lineup_dispatch_selected_total").increment(1);
                Ok(Some(candidate.closer))
            }
            None => {
                debug!(team_id = team_id, "团队没有可接单的closer");
                counter!("lineup_dispatch_no_capacity_total").increment(1);
                Ok(None)
            }
        }
    }

    /// 轮转全景: 团队全部在班closer带工作量, 按选择器视角排序
    ///
    /// 供排班视图与重派扫描使用, 不做可用性过滤
    pub async fn team_lineup(&self, team_id: &str) -> DispatchResult<Vec<Candidate>> {
        let on_duty = self.closer_repo.list_on_duty(team_id).await?;
        let mut lineup = Vec::new();

        for closer in on_duty {
            let live_count = self.lead_repo.live_assignment_count(&closer.id).await?;
            lineup.push(Candidate { closer, live_count });
        }

        lineup.sort_by(compare_candidates);
        Ok(lineup)
    }
}
