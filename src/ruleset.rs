//! Composition of recurrence rules and explicit dates.

use std::cell::RefCell;
use std::fmt;

use hashbrown::{HashMap, HashSet};

use crate::cache::{QueryCache, bound_key, range_key};
use crate::error::Error;
use crate::model::date::HijriDate;
use crate::rrule::{RRule, write_date_token};

/// A recurrence set: the union of inclusion rules and dates, minus the
/// union of exclusion rules and dates. Keys are day-granular, so two
/// occurrences on the same (year, month, day) collapse into one.
///
/// Unlike [`RRule`], a set is mutable; every mutation drops the memoized
/// query results.
#[derive(Debug, Default, Clone)]
pub struct RRuleSet {
    rrules: Vec<RRule>,
    rdates: Vec<HijriDate>,
    exrules: Vec<RRule>,
    exdates: Vec<HijriDate>,
    tzid: Option<String>,
    cache: RefCell<QueryCache>,
}

impl RRuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an inclusion rule.
    pub fn rrule(&mut self, rule: RRule) {
        self.rrules.push(rule);
        self.cache.borrow_mut().clear();
    }

    /// Adds an explicit inclusion date.
    pub fn rdate(&mut self, date: HijriDate) {
        self.rdates.push(date);
        self.cache.borrow_mut().clear();
    }

    /// Adds an exclusion rule.
    pub fn exrule(&mut self, rule: RRule) {
        self.exrules.push(rule);
        self.cache.borrow_mut().clear();
    }

    /// Adds an explicit exclusion date.
    pub fn exdate(&mut self, date: HijriDate) {
        self.exdates.push(date);
        self.cache.borrow_mut().clear();
    }

    /// Sets the shared timezone identifier carried by the set.
    pub fn set_tzid(&mut self, tzid: Option<String>) {
        self.tzid = tzid;
        self.cache.borrow_mut().clear();
    }

    pub fn tzid(&self) -> Option<&str> {
        self.tzid.as_deref()
    }

    pub fn rrules(&self) -> &[RRule] {
        &self.rrules
    }

    pub fn rdates(&self) -> &[HijriDate] {
        &self.rdates
    }

    pub fn exrules(&self) -> &[RRule] {
        &self.exrules
    }

    pub fn exdates(&self) -> &[HijriDate] {
        &self.exdates
    }

    /// All occurrences of the set, ascending. Memoized.
    pub fn all(&self) -> Result<Vec<HijriDate>, Error> {
        if let Some(dates) = &self.cache.borrow().all {
            return Ok(dates.clone());
        }

        let dates = self.materialize()?;
        self.cache.borrow_mut().all = Some(dates.clone());
        Ok(dates)
    }

    /// The occurrences between `after` and `before`. Memoized.
    pub fn between(
        &self,
        after: HijriDate,
        before: HijriDate,
        inclusive: bool,
    ) -> Result<Vec<HijriDate>, Error> {
        let key = range_key(&after, &before, inclusive);
        if let Some(dates) = self.cache.borrow().between.get(&key) {
            return Ok(dates.clone());
        }

        let dates: Vec<HijriDate> = self
            .all()?
            .into_iter()
            .filter(|date| {
                if inclusive {
                    *date >= after && *date <= before
                } else {
                    *date > after && *date < before
                }
            })
            .collect();

        self.cache
            .borrow_mut()
            .between
            .insert(key, dates.clone());
        Ok(dates)
    }

    /// The first occurrence past `date` (or at it, when inclusive).
    /// Memoized.
    pub fn after(
        &self,
        date: HijriDate,
        inclusive: bool,
    ) -> Result<Option<HijriDate>, Error> {
        let key = bound_key(&date, inclusive);
        if let Some(hit) = self.cache.borrow().after.get(&key) {
            return Ok(*hit);
        }

        let found = self
            .all()?
            .into_iter()
            .find(|candidate| {
                if inclusive {
                    *candidate >= date
                } else {
                    *candidate > date
                }
            });

        self.cache.borrow_mut().after.insert(key, found);
        Ok(found)
    }

    /// The last occurrence before `date` (or at it, when inclusive).
    /// Memoized.
    pub fn before(
        &self,
        date: HijriDate,
        inclusive: bool,
    ) -> Result<Option<HijriDate>, Error> {
        let key = bound_key(&date, inclusive);
        if let Some(hit) = self.cache.borrow().before.get(&key) {
            return Ok(*hit);
        }

        let found = self
            .all()?
            .into_iter()
            .take_while(|candidate| {
                if inclusive {
                    *candidate <= date
                } else {
                    *candidate < date
                }
            })
            .last();

        self.cache.borrow_mut().before.insert(key, found);
        Ok(found)
    }

    /// Union of inclusions keyed by (year, month, day), minus the union
    /// of exclusions, sorted ascending.
    fn materialize(&self) -> Result<Vec<HijriDate>, Error> {
        let mut included: HashMap<(i32, u8, u8), HijriDate> = HashMap::new();

        for rule in &self.rrules {
            for result in rule.iter() {
                let date = result?;
                included.entry(key(&date)).or_insert(date);
            }
        }
        for &date in &self.rdates {
            included.entry(key(&date)).or_insert(date);
        }

        let mut excluded: HashSet<(i32, u8, u8)> = HashSet::new();
        for rule in &self.exrules {
            for result in rule.iter() {
                excluded.insert(key(&result?));
            }
        }
        for date in &self.exdates {
            excluded.insert(key(date));
        }

        let mut dates: Vec<HijriDate> = included
            .into_iter()
            .filter(|(ymd, _)| !excluded.contains(ymd))
            .map(|(_, date)| date)
            .collect();
        dates.sort_unstable();
        Ok(dates)
    }
}

impl fmt::Display for RRuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        let mut newline = |f: &mut fmt::Formatter<'_>| {
            if first {
                first = false;
                Ok(())
            } else {
                f.write_str("\n")
            }
        };

        for rule in &self.rrules {
            newline(f)?;
            write!(f, "{rule}")?;
        }

        if !self.rdates.is_empty() {
            newline(f)?;
            f.write_str("RDATE:")?;
            for (index, date) in self.rdates.iter().enumerate() {
                if index > 0 {
                    f.write_str(",")?;
                }
                write_date_token(f, date)?;
            }
        }

        for rule in &self.exrules {
            newline(f)?;
            f.write_str("EXRULE:")?;
            rule.write_parts(f)?;
        }

        if !self.exdates.is_empty() {
            newline(f)?;
            f.write_str("EXDATE:")?;
            for (index, date) in self.exdates.iter().enumerate() {
                if index > 0 {
                    f.write_str(",")?;
                }
                write_date_token(f, date)?;
            }
        }

        Ok(())
    }
}

fn key(date: &HijriDate) -> (i32, u8, u8) {
    (date.year(), date.month(), date.day())
}
