use crate::engine::{Move, Session};

/// Root evaluation of one direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BranchEval {
    pub dir: Move,
    /// Score of the probed position; 0.0 when the move is illegal.
    pub ev: f64,
    /// Whether the move changes the board.
    pub legal: bool,
}

/// Probe every direction in `Move::ALL` order and score each changed result.
///
/// `score` receives the current session and the probed one, so scorers can
/// read the merge gain as the score difference.
pub(crate) fn evaluate_branches<F>(session: &Session, score: F) -> [BranchEval; 4]
where
    F: Fn(&Session, &Session) -> f64,
{
    Move::ALL.map(|dir| match session.probe(dir) {
        Some(next) => BranchEval { dir, ev: score(session, &next), legal: true },
        None => BranchEval { dir, ev: 0.0, legal: false },
    })
}

/// Highest-scoring legal branch; ties go to the first one seen.
pub(crate) fn best_branch(branches: &[BranchEval; 4]) -> Option<Move> {
    let mut best: Option<&BranchEval> = None;
    for branch in branches.iter().filter(|b| b.legal) {
        if best.map_or(true, |b| branch.ev > b.ev) {
            best = Some(branch);
        }
    }
    best.map(|b| b.dir)
}
