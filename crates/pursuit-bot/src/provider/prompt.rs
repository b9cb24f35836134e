use crate::bot::MoveCandidate;
use pursuit_core::belief::BeliefEntry;
use pursuit_core::game::GameState;
use pursuit_core::model::moves::Move;
use pursuit_core::model::role::Role;
use pursuit_core::model::tickets::Ticket;
use std::fmt::Write;

/// Everything a prompt describes for one decision.
#[derive(Debug, Clone, Copy)]
pub struct PromptInput<'a> {
    pub state: &'a GameState,
    pub role: Role,
    pub candidates: &'a [MoveCandidate],
    pub belief: &'a [BeliefEntry],
    pub history_window: usize,
}

/// Renders the natural-language prompt sent to providers.
///
/// Detectives only see culprit positions disclosed on reveal turns and never
/// see the mode of a concealed move.
pub fn build_prompt(input: &PromptInput<'_>) -> String {
    let mut out = String::new();
    let state = input.state;
    let role = input.role;
    let side = if role.is_culprit() {
        "the hidden culprit; stay out of reach of the detectives"
    } else {
        "a detective; land on the culprit's cell"
    };
    let _ = writeln!(out, "You are {role}, {side}.");

    if let Some(player) = state.player(role) {
        match player.position() {
            Some(position) => {
                let _ = writeln!(out, "Current position: {position}.");
            }
            None => {
                let _ = writeln!(out, "Current position: unknown.");
            }
        }
        let _ = writeln!(out, "Tickets: {}.", player.tickets());
    }

    let turns = state.culprit_turns();
    let _ = writeln!(
        out,
        "Culprit turn {turns} of {}; reveal turns: {:?}.",
        state.max_culprit_turns(),
        state.reveal_schedule().turns()
    );
    for detective in state.detectives() {
        if let Some(position) = detective.position() {
            let _ = writeln!(out, "{} is at {position}.", detective.role());
        }
    }

    let _ = writeln!(out, "\nLegal moves:");
    for candidate in input.candidates {
        let mut notes = Vec::new();
        if candidate.concealed {
            notes.push("needs concealment".to_string());
        }
        if candidate.bottleneck {
            notes.push("bottleneck".to_string());
        }
        if candidate.key {
            notes.push("key location".to_string());
        }
        notes.push(format!("heuristic {:.1}", candidate.heuristic));
        let _ = writeln!(
            out,
            "- {} to {} ({})",
            candidate.mode,
            candidate.target,
            notes.join(", ")
        );
    }

    if !input.belief.is_empty() {
        let _ = writeln!(out, "\nEstimated culprit locations:");
        for entry in input.belief {
            let _ = writeln!(out, "- {} with probability {:.2}", entry.location, entry.probability);
        }
    }

    let history = redacted_history(state, role, input.history_window);
    if !history.is_empty() {
        let _ = writeln!(out, "\nRecent moves, oldest first:");
        for line in history {
            let _ = writeln!(out, "- {line}");
        }
    }

    let _ = writeln!(
        out,
        "\nReply with only a JSON object: {{\"mode\": \"taxi|bus|underground|ferry\", \
         \"targetLocation\": <number>, \"concealed\": <bool>, \"double\": <bool>}}."
    );
    if role.is_culprit() {
        if let Some(player) = state.player(role) {
            let tickets = player.tickets();
            let _ = writeln!(
                out,
                "You may conceal ({} left) or use a double move ({} left).",
                tickets.count(Ticket::Concealment),
                tickets.count(Ticket::Double)
            );
        }
    } else {
        let _ = writeln!(out, "Detectives cannot conceal or double; set both to false.");
    }
    out
}

fn redacted_history(state: &GameState, viewer: Role, window: usize) -> Vec<String> {
    let schedule = state.reveal_schedule();
    let mut culprit_turn = 0;
    let mut lines: Vec<String> = state
        .history()
        .iter()
        .map(|mv| {
            if mv.role.is_culprit() {
                culprit_turn += 1;
                describe_culprit(mv, viewer, schedule.is_reveal_turn(culprit_turn))
            } else {
                format!("{} took the {} to {}", mv.role, mv.mode, mv.target)
            }
        })
        .collect();
    let skip = lines.len().saturating_sub(window);
    lines.drain(..skip);
    lines
}

fn describe_culprit(mv: &Move, viewer: Role, revealed: bool) -> String {
    if viewer.is_culprit() {
        let concealed = if mv.concealed { " (concealed)" } else { "" };
        return format!("you took the {} to {}{concealed}", mv.mode, mv.target);
    }
    let mode = if mv.concealed {
        "a concealed ride".to_string()
    } else {
        format!("the {}", mv.mode)
    };
    if revealed {
        format!("culprit took {mode} and was seen at {}", mv.target)
    } else {
        format!("culprit took {mode} to an unknown location")
    }
}
