//src/types.rs

use std::fmt;
use std::str::FromStr;

/// NCBI-style taxonomy identifier.
pub type TaxId = u32;

/// Number of ranks carried by every lineage row.
pub const RANK_COUNT: usize = 8;

/// The fixed taxonomic ranks, most specific first.
/// The discriminants match the column order of the reference lineage file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rank {
    Species = 0,
    Genus,
    Family,
    Order,
    Class,
    Phylum,
    Kingdom,
    Domain,
}

impl Rank {
    /// All ranks in file column order (species -> domain).
    pub const ALL: [Rank; RANK_COUNT] = [
        Rank::Species,
        Rank::Genus,
        Rank::Family,
        Rank::Order,
        Rank::Class,
        Rank::Phylum,
        Rank::Kingdom,
        Rank::Domain,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Rank::Species => "species",
            Rank::Genus => "genus",
            Rank::Family => "family",
            Rank::Order => "order",
            Rank::Class => "class",
            Rank::Phylum => "phylum",
            Rank::Kingdom => "kingdom",
            Rank::Domain => "domain",
        }
    }

    /// The label assigned when a gene's homologs span several distinct taxa at this rank:
    /// the gene is then restricted to the enclosing, more general rank.
    pub fn divergence_label(self) -> ClassificationLabel {
        match self {
            Rank::Species => ClassificationLabel::GenusRestricted,
            Rank::Genus => ClassificationLabel::FamilyRestricted,
            Rank::Family => ClassificationLabel::OrderRestricted,
            Rank::Order => ClassificationLabel::ClassRestricted,
            Rank::Class => ClassificationLabel::PhylumRestricted,
            Rank::Phylum => ClassificationLabel::KingdomRestricted,
            Rank::Kingdom => ClassificationLabel::DomainRestricted,
            Rank::Domain => ClassificationLabel::MultiDomain,
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One taxonomy node's ancestor chain across the fixed ranks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedLineage {
    pub tax_id: TaxId,
    pub name: String,
    /// Indexed by `Rank::index()`. `None` where the reference has no ancestor at that rank.
    pub ancestors: [Option<TaxId>; RANK_COUNT],
}

impl RankedLineage {
    #[inline]
    pub fn ancestor(&self, rank: Rank) -> Option<TaxId> {
        self.ancestors[rank.index()]
    }
}

/// A gene from the query organism, as produced by sequence parsing.
#[derive(Debug, Clone)]
pub struct Gene {
    pub gene_id: String,
    /// Organism the gene was parsed from; a mismatch with the run's organism is logged.
    pub tax_id: TaxId,
}

/// One homology-search hit for a query gene.
#[derive(Debug, Clone, PartialEq)]
pub struct HomologyHit {
    pub gene_id: String,
    pub target_tax_id: TaxId,
    pub percent_identity: f64,
}

/// Restriction level, from most restrictive to least.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ClassificationLabel {
    Orfan,
    GenusRestricted,
    FamilyRestricted,
    OrderRestricted,
    ClassRestricted,
    PhylumRestricted,
    KingdomRestricted,
    DomainRestricted,
    MultiDomain,
}

impl ClassificationLabel {
    pub const ALL: [ClassificationLabel; 9] = [
        ClassificationLabel::Orfan,
        ClassificationLabel::GenusRestricted,
        ClassificationLabel::FamilyRestricted,
        ClassificationLabel::OrderRestricted,
        ClassificationLabel::ClassRestricted,
        ClassificationLabel::PhylumRestricted,
        ClassificationLabel::KingdomRestricted,
        ClassificationLabel::DomainRestricted,
        ClassificationLabel::MultiDomain,
    ];

    /// Stable vocabulary shared with the reporting and persistence layers.
    pub fn as_str(self) -> &'static str {
        match self {
            ClassificationLabel::Orfan => "ORFAN",
            ClassificationLabel::GenusRestricted => "GENUS_RESTRICTED",
            ClassificationLabel::FamilyRestricted => "FAMILY_RESTRICTED",
            ClassificationLabel::OrderRestricted => "ORDER_RESTRICTED",
            ClassificationLabel::ClassRestricted => "CLASS_RESTRICTED",
            ClassificationLabel::PhylumRestricted => "PHYLUM_RESTRICTED",
            ClassificationLabel::KingdomRestricted => "KINGDOM_RESTRICTED",
            ClassificationLabel::DomainRestricted => "DOMAIN_RESTRICTED",
            ClassificationLabel::MultiDomain => "MULTI_DOMAIN",
        }
    }
}

impl fmt::Display for ClassificationLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClassificationLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ClassificationLabel::ALL
            .into_iter()
            .find(|label| label.as_str() == s)
            .ok_or_else(|| format!("unknown classification label '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_order_matches_columns() {
        for (i, rank) in Rank::ALL.iter().enumerate() {
            assert_eq!(rank.index(), i);
        }
        assert_eq!(Rank::ALL[RANK_COUNT - 1], Rank::Domain);
    }

    #[test]
    fn divergence_labels_are_one_step_more_general() {
        assert_eq!(Rank::Domain.divergence_label(), ClassificationLabel::MultiDomain);
        assert_eq!(Rank::Kingdom.divergence_label(), ClassificationLabel::DomainRestricted);
        assert_eq!(Rank::Genus.divergence_label(), ClassificationLabel::FamilyRestricted);
        assert_eq!(Rank::Species.divergence_label(), ClassificationLabel::GenusRestricted);
    }

    #[test]
    fn labels_are_ordered_by_restriction() {
        assert!(ClassificationLabel::Orfan < ClassificationLabel::GenusRestricted);
        assert!(ClassificationLabel::DomainRestricted < ClassificationLabel::MultiDomain);
        let mut sorted = ClassificationLabel::ALL;
        sorted.sort();
        assert_eq!(sorted, ClassificationLabel::ALL);
    }

    #[test]
    fn label_vocabulary_parses_back() {
        for label in ClassificationLabel::ALL {
            assert_eq!(label.as_str().parse::<ClassificationLabel>(), Ok(label));
        }
        assert!("STRICT_ORFAN".parse::<ClassificationLabel>().is_err());
    }
}
