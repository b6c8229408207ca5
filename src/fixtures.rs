use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::conditions::Condition;
use crate::name_match::{MatchRule, MatcherChain};
use crate::odds_feed::{Market, QuoteFeed, Venue};

#[derive(Debug, Clone, PartialEq)]
pub struct FixtureInfo {
    pub opponent: String,
    pub venue: Venue,
    pub kickoff: Option<DateTime<Utc>>,
    pub quotes: BTreeMap<Market, f64>,
}

impl FixtureInfo {
    pub fn describe(&self) -> String {
        let when = self
            .kickoff
            .map(|k| k.format("%d/%m %H:%M").to_string())
            .unwrap_or_else(|| "?".to_string());
        format!("{when} -> {} ({})", self.opponent, self.venue.label())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FixtureLookup {
    Found {
        feed_key: String,
        rule: MatchRule,
        info: FixtureInfo,
    },
    NoFixture,
    FeedUnavailable,
}

impl FixtureLookup {
    pub fn info(&self) -> Option<&FixtureInfo> {
        match self {
            FixtureLookup::Found { info, .. } => Some(info),
            _ => None,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            FixtureLookup::Found { info, .. } => info.describe(),
            FixtureLookup::NoFixture => "no fixture".to_string(),
            FixtureLookup::FeedUnavailable => "unavailable".to_string(),
        }
    }

    /// Price of the bet against `condition` continuing in the next fixture.
    pub fn quote_for(&self, condition: Condition) -> QuoteLookup {
        let info = match self {
            FixtureLookup::Found { info, .. } => info,
            FixtureLookup::NoFixture => return QuoteLookup::NoFixture,
            FixtureLookup::FeedUnavailable => return QuoteLookup::FeedUnavailable,
        };
        let Some(market) = inverse_market(condition) else {
            return QuoteLookup::NoMarketForCondition;
        };
        match info.quotes.get(&market) {
            Some(price) => QuoteLookup::Price {
                market,
                price: *price,
            },
            None => QuoteLookup::PriceUnavailable(market),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QuoteLookup {
    Price { market: Market, price: f64 },
    PriceUnavailable(Market),
    NoMarketForCondition,
    NoFixture,
    FeedUnavailable,
}

impl QuoteLookup {
    pub fn price(&self) -> Option<f64> {
        match self {
            QuoteLookup::Price { price, .. } => Some(*price),
            _ => None,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            QuoteLookup::Price { market, price } => format!("{price:.2} ({market})"),
            QuoteLookup::PriceUnavailable(market) => format!("({market}?)"),
            QuoteLookup::NoMarketForCondition => "(no market)".to_string(),
            QuoteLookup::NoFixture => "(no fixture)".to_string(),
            QuoteLookup::FeedUnavailable => "(feed unavailable)".to_string(),
        }
    }
}

/// The market that pays when the streak ends.
pub fn inverse_market(condition: Condition) -> Option<Market> {
    match condition {
        Condition::FtUnder05 => Some(Market::Over(5)),
        Condition::FtOver15 => Some(Market::Under(15)),
        Condition::FtUnder15 => Some(Market::Over(15)),
        Condition::FtOver25 => Some(Market::Under(25)),
        Condition::FtUnder25 => Some(Market::Over(25)),
        Condition::FtOver35 => Some(Market::Under(35)),
        Condition::FtUnder35 => Some(Market::Over(35)),
        Condition::FtDraw => Some(Market::HomeOrAway),
        Condition::FtCleanSheet => Some(Market::BttsYes),
        Condition::FtConceded => Some(Market::BttsNo),
        Condition::FtScored
        | Condition::HtOver05
        | Condition::HtUnder05
        | Condition::HtOver15
        | Condition::HtUnder15 => None,
    }
}

pub struct TeamFixtureResolver<'f> {
    feed: Option<&'f QuoteFeed>,
    matchers: MatcherChain,
}

impl<'f> TeamFixtureResolver<'f> {
    /// `feed` is `None` when the quote feed could not be loaded for this batch.
    pub fn new(feed: Option<&'f QuoteFeed>, matchers: MatcherChain) -> Self {
        Self { feed, matchers }
    }

    pub fn resolve(&self, team: &str) -> FixtureLookup {
        let Some(feed) = self.feed else {
            return FixtureLookup::FeedUnavailable;
        };
        let Some(resolution) = self.matchers.resolve(team, feed.keys()) else {
            return FixtureLookup::NoFixture;
        };
        let Some(entry) = feed.get(resolution.feed_key) else {
            return FixtureLookup::NoFixture;
        };
        FixtureLookup::Found {
            feed_key: resolution.feed_key.to_string(),
            rule: resolution.rule,
            info: FixtureInfo {
                opponent: entry.opponent.clone(),
                venue: entry.venue,
                kickoff: entry.kickoff,
                quotes: entry.quotes.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed() -> QuoteFeed {
        let mut quotes = BTreeMap::new();
        quotes.insert(Market::Under(25), 2.10);
        quotes.insert(Market::Over(25), 1.75);
        let mut feed = QuoteFeed::default();
        feed.insert_event("Manchester United FC", "Everton FC", None, quotes);
        feed
    }

    #[test]
    fn resolved_fixture_reads_inverse_market() {
        let feed = feed();
        let resolver = TeamFixtureResolver::new(Some(&feed), MatcherChain::standard());
        let lookup = resolver.resolve("Man United");
        assert_eq!(
            lookup.quote_for(Condition::FtOver25),
            QuoteLookup::Price {
                market: Market::Under(25),
                price: 2.10
            }
        );
        assert_eq!(
            lookup.quote_for(Condition::FtOver35),
            QuoteLookup::PriceUnavailable(Market::Under(35))
        );
        assert_eq!(
            lookup.quote_for(Condition::HtOver05),
            QuoteLookup::NoMarketForCondition
        );
    }

    #[test]
    fn unknown_team_is_no_fixture_not_missing_price() {
        let feed = feed();
        let resolver = TeamFixtureResolver::new(Some(&feed), MatcherChain::standard());
        let lookup = resolver.resolve("Burnley");
        assert_eq!(lookup, FixtureLookup::NoFixture);
        assert_eq!(lookup.quote_for(Condition::FtOver25), QuoteLookup::NoFixture);
    }

    #[test]
    fn missing_feed_degrades_to_unavailable() {
        let resolver = TeamFixtureResolver::new(None, MatcherChain::standard());
        assert_eq!(resolver.resolve("Everton"), FixtureLookup::FeedUnavailable);
    }
}
