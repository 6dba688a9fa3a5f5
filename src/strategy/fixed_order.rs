use crate::engine::{Move, Session};

/// Priority order of the corner strategy; keeps tiles packed bottom-left.
pub const CORNER_ORDER: [Move; 4] = [Move::Down, Move::Left, Move::Right, Move::Up];
/// Priority order of the center strategy.
pub const CENTER_ORDER: [Move; 4] = [Move::Down, Move::Right, Move::Up, Move::Left];

/// First direction of `order` whose slide changes the board.
pub(crate) fn first_changing(session: &Session, order: &[Move]) -> Option<Move> {
    order.iter().copied().find(|&dir| session.probe(dir).is_some())
}

/// First direction of `Move::ALL` that merges something, else the corner choice.
pub(crate) fn opportunistic(session: &Session) -> Option<Move> {
    Move::ALL
        .into_iter()
        .find(|&dir| session.probe(dir).is_some_and(|next| next.score() > session.score()))
        .or_else(|| first_changing(session, &CORNER_ORDER))
}
