use super::reveal::{Reveal, RevealSchedule};
use crate::map::TransportGraph;
use crate::model::location::Location;
use crate::model::moves::Move;
use crate::model::player::Player;
use crate::model::role::Role;
use crate::model::tickets::{Ticket, TicketError, TicketInventory};
use crate::model::transport::TransportMode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_MAX_CULPRIT_TURNS: u32 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Culprit,
    Detectives,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum GameStatus {
    Active,
    Finished { winner: Side },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("game is already finished")]
    Finished,
    #[error("{found} moved out of turn; {expected} is to move")]
    OutOfTurn { expected: Role, found: Role },
    #[error("{0} is not seated in this game")]
    UnknownPlayer(Role),
    #[error("{0} has no known position")]
    MissingPosition(Role),
    #[error("no {mode} link from {from} to {to}")]
    NoLink {
        from: Location,
        to: Location,
        mode: TransportMode,
    },
    #[error("location {0} is occupied by a detective")]
    Occupied(Location),
    #[error("double move unavailable: {0}")]
    DoubleUnavailable(&'static str),
    #[error("{0} cannot stay put while a legal move exists")]
    IllegalStay(Role),
    #[error(transparent)]
    Ticket(#[from] TicketError),
}

/// Snapshot of a game in progress.
///
/// The culprit moves first; detectives follow in player-list order. Every
/// culprit move record (each leg of a double move included) counts as one
/// culprit turn for the reveal schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    players: Vec<Player>,
    #[serde(default)]
    history: Vec<Move>,
    to_move: Role,
    #[serde(default)]
    double_pending: bool,
    status: GameStatus,
    #[serde(default)]
    reveal: RevealSchedule,
    #[serde(default = "default_max_culprit_turns")]
    max_culprit_turns: u32,
}

fn default_max_culprit_turns() -> u32 {
    DEFAULT_MAX_CULPRIT_TURNS
}

impl GameState {
    pub fn new(players: Vec<Player>) -> Self {
        Self {
            players,
            history: Vec::new(),
            to_move: Role::Culprit,
            double_pending: false,
            status: GameStatus::Active,
            reveal: RevealSchedule::default(),
            max_culprit_turns: DEFAULT_MAX_CULPRIT_TURNS,
        }
    }

    pub fn with_reveal_schedule(mut self, reveal: RevealSchedule) -> Self {
        self.reveal = reveal;
        self
    }

    pub fn with_max_culprit_turns(mut self, turns: u32) -> Self {
        self.max_culprit_turns = turns.max(1);
        self
    }

    /// Replaces the recorded history without replaying it. Positions and
    /// tickets are taken as given by the players.
    pub fn with_history(mut self, history: Vec<Move>) -> Self {
        self.history = history;
        self
    }

    pub fn with_to_move(mut self, role: Role) -> Self {
        self.to_move = role;
        self
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, role: Role) -> Option<&Player> {
        self.players.iter().find(|player| player.role() == role)
    }

    pub fn culprit(&self) -> Option<&Player> {
        self.player(Role::Culprit)
    }

    pub fn detectives(&self) -> impl Iterator<Item = &Player> + '_ {
        self.players
            .iter()
            .filter(|player| player.role().is_detective())
    }

    pub fn detective_positions(&self) -> Vec<Location> {
        self.detectives()
            .filter_map(|player| player.position())
            .collect()
    }

    pub fn is_occupied_by_detective(&self, location: Location) -> bool {
        self.detectives()
            .any(|player| player.position() == Some(location))
    }

    pub fn history(&self) -> &[Move] {
        &self.history
    }

    pub fn to_move(&self) -> Role {
        self.to_move
    }

    pub fn double_pending(&self) -> bool {
        self.double_pending
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.status, GameStatus::Finished { .. })
    }

    pub fn winner(&self) -> Option<Side> {
        match self.status {
            GameStatus::Finished { winner } => Some(winner),
            GameStatus::Active => None,
        }
    }

    pub fn reveal_schedule(&self) -> &RevealSchedule {
        &self.reveal
    }

    pub fn max_culprit_turns(&self) -> u32 {
        self.max_culprit_turns
    }

    pub fn culprit_moves(&self) -> impl DoubleEndedIterator<Item = &Move> + '_ {
        self.history.iter().filter(|mv| mv.role.is_culprit())
    }

    pub fn detective_moves(&self) -> impl DoubleEndedIterator<Item = &Move> + '_ {
        self.history.iter().filter(|mv| mv.role.is_detective())
    }

    pub fn culprit_turns(&self) -> u32 {
        self.culprit_moves().count() as u32
    }

    /// Targets of the last `window` detective moves, most recent first.
    pub fn recent_detective_targets(&self, window: usize) -> Vec<Location> {
        self.detective_moves()
            .rev()
            .take(window)
            .map(|mv| mv.target)
            .collect()
    }

    /// The most recent culprit position disclosed by the reveal schedule.
    pub fn last_reveal(&self) -> Option<Reveal> {
        let turns = self.culprit_turns();
        let turn = self.reveal.last_reveal_at_or_before(turns)?;
        let index = (turn as usize).checked_sub(1)?;
        let mv = self.culprit_moves().nth(index)?;
        Some(Reveal {
            turn,
            location: mv.target,
            mode: mv.mode,
        })
    }

    /// True when the latest culprit move was made on a reveal turn.
    pub fn is_culprit_revealed(&self) -> bool {
        let turns = self.culprit_turns();
        turns > 0 && self.reveal.is_reveal_turn(turns)
    }

    /// Culprit moves recorded after the last reveal (all of them when none happened).
    pub fn culprit_moves_since_reveal(&self) -> Vec<Move> {
        let skip = self.last_reveal().map(|reveal| reveal.turn as usize).unwrap_or(0);
        self.culprit_moves().skip(skip).copied().collect()
    }

    /// Position detectives can currently see, if any.
    pub fn visible_culprit_position(&self) -> Option<Location> {
        if self.is_culprit_revealed() {
            self.last_reveal().map(|reveal| reveal.location)
        } else {
            None
        }
    }

    /// Determinized placement of the culprit for simulation clones.
    pub fn place_culprit(&mut self, location: Location) {
        if let Some(culprit) = self.player_mut(Role::Culprit) {
            culprit.relocate(location);
        }
    }

    pub fn has_legal_move(&self, graph: &TransportGraph, role: Role) -> bool {
        let Some(player) = self.player(role) else {
            return false;
        };
        let Some(from) = player.position() else {
            return false;
        };
        graph.edges(from).any(|(mode, target)| {
            player.tickets().can_travel(mode) && !self.is_occupied_by_detective(target)
        })
    }

    /// Checks a move against the current snapshot without applying it.
    pub fn validate_move(&self, graph: &TransportGraph, mv: &Move) -> Result<(), MoveError> {
        if self.is_finished() {
            return Err(MoveError::Finished);
        }
        if mv.role != self.to_move {
            return Err(MoveError::OutOfTurn {
                expected: self.to_move,
                found: mv.role,
            });
        }
        let player = self
            .player(mv.role)
            .ok_or(MoveError::UnknownPlayer(mv.role))?;
        let from = player
            .position()
            .ok_or(MoveError::MissingPosition(mv.role))?;

        if mv.is_stay_at(from) {
            if self.has_legal_move(graph, mv.role) {
                return Err(MoveError::IllegalStay(mv.role));
            }
            return Ok(());
        }

        if !graph.connects(from, mv.target, mv.mode) {
            return Err(MoveError::NoLink {
                from,
                to: mv.target,
                mode: mv.mode,
            });
        }
        if self.is_occupied_by_detective(mv.target) {
            return Err(MoveError::Occupied(mv.target));
        }

        let mut probe = *player.tickets();
        spend_tickets(&mut probe, mv)?;

        if mv.double {
            if self.double_pending {
                return Err(MoveError::DoubleUnavailable("a double move is already in progress"));
            }
            if self.culprit_turns() + 2 > self.max_culprit_turns {
                return Err(MoveError::DoubleUnavailable("no turns left for a second leg"));
            }
        }
        Ok(())
    }

    /// Validates and applies a move, returning the winner if the game ended.
    pub fn apply_move(
        &mut self,
        graph: &TransportGraph,
        mv: Move,
    ) -> Result<Option<Side>, MoveError> {
        self.validate_move(graph, &mv)?;
        let from = self
            .player(mv.role)
            .and_then(|player| player.position())
            .ok_or(MoveError::MissingPosition(mv.role))?;

        if mv.is_stay_at(from) {
            if mv.role.is_culprit() {
                self.finish(Side::Detectives);
                return Ok(self.winner());
            }
            self.advance_turn();
            return Ok(self.winner());
        }

        let player = self
            .player_mut(mv.role)
            .ok_or(MoveError::UnknownPlayer(mv.role))?;
        spend_tickets(player.tickets_mut(), &mv)?;
        player.relocate(mv.target);
        self.history.push(mv);

        if self.is_capture() {
            self.finish(Side::Detectives);
            return Ok(self.winner());
        }

        if mv.role.is_culprit() {
            if mv.double {
                self.double_pending = true;
                return Ok(None);
            }
            self.double_pending = false;
        }

        self.advance_turn();
        Ok(self.winner())
    }

    fn is_capture(&self) -> bool {
        match self.culprit().and_then(|culprit| culprit.position()) {
            Some(hidden) => self.is_occupied_by_detective(hidden),
            None => false,
        }
    }

    fn finish(&mut self, winner: Side) {
        self.status = GameStatus::Finished { winner };
        self.double_pending = false;
    }

    fn advance_turn(&mut self) {
        self.to_move = self.next_role_after(self.to_move);
        if self.to_move.is_culprit() && self.culprit_turns() >= self.max_culprit_turns {
            self.finish(Side::Culprit);
        }
    }

    fn next_role_after(&self, role: Role) -> Role {
        let order: Vec<Role> = std::iter::once(Role::Culprit)
            .chain(self.detectives().map(|player| player.role()))
            .collect();
        let index = order.iter().position(|r| *r == role).unwrap_or(0);
        order[(index + 1) % order.len()]
    }

    fn player_mut(&mut self, role: Role) -> Option<&mut Player> {
        self.players.iter_mut().find(|player| player.role() == role)
    }
}

fn spend_tickets(tickets: &mut TicketInventory, mv: &Move) -> Result<(), MoveError> {
    match mv.travel_ticket() {
        Some(ticket) => tickets.consume(ticket)?,
        None => return Err(MoveError::Ticket(TicketError::Unpayable(mv.mode))),
    }
    if mv.double {
        tickets.consume(Ticket::Double)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(id: u16) -> Location {
        Location::new(id)
    }

    fn graph() -> TransportGraph {
        TransportGraph::builtin().expect("demo map")
    }

    fn two_player_state() -> GameState {
        GameState::new(vec![
            Player::new(Role::Culprit, loc(45), TicketInventory::culprit_default(1)),
            Player::new(
                Role::Detective(1),
                loc(13),
                TicketInventory::detective_default(),
            ),
        ])
    }

    #[test]
    fn apply_move_spends_ticket_and_rotates_turn() {
        let graph = graph();
        let mut state = two_player_state();
        let mv = Move::new(Role::Culprit, TransportMode::Taxi, loc(46));
        assert_eq!(state.apply_move(&graph, mv), Ok(None));
        let culprit = state.culprit().unwrap();
        assert_eq!(culprit.position(), Some(loc(46)));
        assert_eq!(culprit.tickets().count(Ticket::Taxi), 3);
        assert_eq!(state.to_move(), Role::Detective(1));
        assert_eq!(state.history(), &[mv]);
    }

    #[test]
    fn rejects_out_of_turn_and_missing_links() {
        let graph = graph();
        let state = two_player_state();
        let detective = Move::new(Role::Detective(1), TransportMode::Taxi, loc(14));
        assert!(matches!(
            state.validate_move(&graph, &detective),
            Err(MoveError::OutOfTurn { .. })
        ));
        let teleport = Move::new(Role::Culprit, TransportMode::Bus, loc(46));
        assert!(matches!(
            state.validate_move(&graph, &teleport),
            Err(MoveError::NoLink { .. })
        ));
    }

    #[test]
    fn double_move_keeps_culprit_on_turn() {
        let graph = graph();
        let mut state = two_player_state();
        let first = Move::new(Role::Culprit, TransportMode::Taxi, loc(46)).with_double(true);
        state.apply_move(&graph, first).unwrap();
        assert!(state.double_pending());
        assert_eq!(state.to_move(), Role::Culprit);
        let again = Move::new(Role::Culprit, TransportMode::Taxi, loc(47)).with_double(true);
        assert!(matches!(
            state.validate_move(&graph, &again),
            Err(MoveError::DoubleUnavailable(_))
        ));
        let second = Move::new(Role::Culprit, TransportMode::Taxi, loc(47));
        state.apply_move(&graph, second).unwrap();
        assert!(!state.double_pending());
        assert_eq!(state.to_move(), Role::Detective(1));
        assert_eq!(state.culprit_turns(), 2);
        assert_eq!(
            state.culprit().unwrap().tickets().count(Ticket::Double),
            1
        );
    }

    #[test]
    fn detective_landing_on_culprit_captures() {
        let graph = graph();
        let mut state = GameState::new(vec![
            Player::new(Role::Culprit, loc(15), TicketInventory::culprit_default(1)),
            Player::new(
                Role::Detective(1),
                loc(13),
                TicketInventory::detective_default(),
            ),
        ]);
        state
            .apply_move(&graph, Move::new(Role::Culprit, TransportMode::Taxi, loc(14)))
            .unwrap();
        let winner = state
            .apply_move(
                &graph,
                Move::new(Role::Detective(1), TransportMode::Taxi, loc(14)),
            )
            .unwrap();
        assert_eq!(winner, Some(Side::Detectives));
        assert!(state.is_finished());
    }

    #[test]
    fn reveal_tracking_follows_schedule() {
        let graph = graph();
        let mut state = two_player_state().with_reveal_schedule(RevealSchedule::new(vec![2]));
        for (culprit_target, detective_target) in [(46, 14), (47, 15)] {
            state
                .apply_move(
                    &graph,
                    Move::new(Role::Culprit, TransportMode::Taxi, loc(culprit_target)),
                )
                .unwrap();
            if state.culprit_turns() == 1 {
                assert!(state.last_reveal().is_none());
                assert!(!state.is_culprit_revealed());
            }
            state
                .apply_move(
                    &graph,
                    Move::new(
                        Role::Detective(1),
                        TransportMode::Taxi,
                        loc(detective_target),
                    ),
                )
                .unwrap();
        }
        assert!(state.is_culprit_revealed());
        let reveal = state.last_reveal().expect("revealed on turn 2");
        assert_eq!(reveal.turn, 2);
        assert_eq!(reveal.location, loc(47));
        assert!(state.culprit_moves_since_reveal().is_empty());
        assert_eq!(state.visible_culprit_position(), Some(loc(47)));
    }

    #[test]
    fn culprit_wins_after_final_turn() {
        let graph = graph();
        let mut state = two_player_state().with_max_culprit_turns(1);
        state
            .apply_move(&graph, Move::new(Role::Culprit, TransportMode::Taxi, loc(46)))
            .unwrap();
        let winner = state
            .apply_move(
                &graph,
                Move::new(Role::Detective(1), TransportMode::Taxi, loc(14)),
            )
            .unwrap();
        assert_eq!(winner, Some(Side::Culprit));
    }

    #[test]
    fn stranded_detective_may_stay() {
        let graph = graph();
        let mut state = GameState::new(vec![
            Player::new(Role::Culprit, loc(45), TicketInventory::culprit_default(1)),
            Player::new(Role::Detective(1), loc(13), TicketInventory::default()),
        ])
        .with_to_move(Role::Detective(1));
        let stay = Move::stay(Role::Detective(1), loc(13));
        assert_eq!(state.apply_move(&graph, stay), Ok(None));
        assert_eq!(state.to_move(), Role::Culprit);
        assert!(state.history().is_empty());

        let culprit_stay = Move::stay(Role::Culprit, loc(45));
        assert_eq!(
            state.validate_move(&graph, &culprit_stay),
            Err(MoveError::IllegalStay(Role::Culprit))
        );
    }
}
