/// Points awarded per credited hit.
pub const HIT_REWARD: u32 = 10;
/// Extra points for bringing a bot's health to zero.
pub const KILL_BONUS: u32 = 50;

/// Score delta for one successful hit.
pub fn hit_score(hit_reward: u32, destroyed_bot: bool, kill_bonus: u32) -> u32 {
    let mut score = hit_reward;
    if destroyed_bot {
        score = score.saturating_add(kill_bonus);
    }
    score
}

/// Entities still needed to win.
pub fn targets_remaining(targets_hit: u32, targets_required: u32) -> u32 {
    targets_required.saturating_sub(targets_hit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_hit() {
        assert_eq!(hit_score(HIT_REWARD, false, KILL_BONUS), 10);
    }

    #[test]
    fn killing_blow_adds_bonus() {
        assert_eq!(hit_score(HIT_REWARD, true, KILL_BONUS), 60);
    }

    #[test]
    fn remaining_never_underflows() {
        assert_eq!(targets_remaining(2, 5), 3);
        assert_eq!(targets_remaining(7, 5), 0);
    }
}
