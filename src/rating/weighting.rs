/// Neutral prior used whenever there is nothing to weigh
pub const NEUTRAL_RATE: f64 = 0.5;

/// Win rate over outcomes ordered most recent first, the i-th weighted by `decay^i`
pub fn decayed_win_rate<I>(outcomes: I, decay: f64) -> f64
where
    I: IntoIterator<Item = bool>,
{
    let (weighted_wins, total_weight) = outcomes
        .into_iter()
        .enumerate()
        .fold((0.0, 0.0), |(wins, total), (i, won)| {
            let weight = decay_weight(decay, i);
            let wins = if won { wins + weight } else { wins };
            (wins, total + weight)
        });

    if total_weight > 0.0 {
        weighted_wins / total_weight
    } else {
        NEUTRAL_RATE
    }
}

/// Signed streak sum: +1 per win, -1 per loss, the i-th most recent scaled by `decay^i`
pub fn streak_score<I>(outcomes: I, decay: f64) -> f64
where
    I: IntoIterator<Item = bool>,
{
    outcomes
        .into_iter()
        .enumerate()
        .map(|(i, won)| signed_outcome(won) * decay_weight(decay, i))
        .sum()
}

fn decay_weight(decay: f64, steps_back: usize) -> f64 {
    decay.powi(steps_back as i32)
}

fn signed_outcome(won: bool) -> f64 {
    if won { 1.0 } else { -1.0 }
}
