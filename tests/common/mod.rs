#![allow(dead_code)]

use std::sync::Mutex;

use serde_json::{Map, Value, json};

use kira_geneset_resolver::error::KiraError;
use kira_geneset_resolver::mygene::{GeneProvider, QueryRequest, QueryResponse, parse_hits};

#[derive(Debug, Clone)]
pub struct MockGene {
    pub id: &'static str,
    pub taxid: u32,
    pub symbol: &'static str,
    pub name: &'static str,
    pub ensembl: &'static [&'static str],
    pub uniprot: &'static [&'static str],
    pub homologene: Option<Value>,
}

impl MockGene {
    fn matches(&self, scope: &str, term: &str) -> bool {
        match scope {
            "_id" | "entrezgene" => self.id == term,
            "symbol" => self.symbol.eq_ignore_ascii_case(term),
            "name" => self.name.to_lowercase().contains(&term.to_lowercase()),
            "ensembl.gene" => self.ensembl.contains(&term),
            "uniprot" => self.uniprot.contains(&term),
            _ => false,
        }
    }

    fn hit(&self, query: &str, fields: &[&str]) -> Value {
        let mut hit = Map::new();
        hit.insert("query".to_string(), json!(query));
        hit.insert("_id".to_string(), json!(self.id));
        for field in fields {
            match *field {
                "symbol" => {
                    hit.insert("symbol".to_string(), json!(self.symbol));
                }
                "name" => {
                    hit.insert("name".to_string(), json!(self.name));
                }
                "entrezgene" => {
                    if let Ok(entrez) = self.id.parse::<u64>() {
                        hit.insert("entrezgene".to_string(), json!(entrez));
                    }
                }
                "ensembl.gene" if !self.ensembl.is_empty() => {
                    let genes: Vec<Value> =
                        self.ensembl.iter().map(|id| json!({"gene": id})).collect();
                    let value = if genes.len() == 1 {
                        genes[0].clone()
                    } else {
                        Value::Array(genes)
                    };
                    hit.insert("ensembl".to_string(), value);
                }
                "uniprot.Swiss-Prot" if !self.uniprot.is_empty() => {
                    let value = if self.uniprot.len() == 1 {
                        json!({"Swiss-Prot": self.uniprot[0]})
                    } else {
                        json!({"Swiss-Prot": self.uniprot})
                    };
                    hit.insert("uniprot".to_string(), value);
                }
                "taxid" => {
                    hit.insert("taxid".to_string(), json!(self.taxid));
                }
                "homologene" => {
                    if let Some(graph) = &self.homologene {
                        hit.insert("homologene".to_string(), graph.clone());
                    }
                }
                _ => {}
            }
        }
        Value::Object(hit)
    }
}

/// In-memory stand-in for mygene.info that records every request.
#[derive(Default)]
pub struct MockProvider {
    genes: Vec<MockGene>,
    failures: Vec<(String, u16)>,
    pub requests: Mutex<Vec<QueryRequest>>,
}

impl MockProvider {
    pub fn new(genes: Vec<MockGene>) -> Self {
        Self {
            genes,
            failures: Vec::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_catalog() -> Self {
        Self::new(catalog())
    }

    /// Every request using `scope` fails with `status`.
    pub fn failing_scope(mut self, scope: &str, status: u16) -> Self {
        self.failures.push((scope.to_string(), status));
        self
    }

    pub fn requests(&self) -> Vec<QueryRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn in_species(species: &str, taxid: u32) -> bool {
        species == "all" || species.split(',').any(|item| item == taxid.to_string())
    }
}

impl GeneProvider for MockProvider {
    fn query_many(&self, request: &QueryRequest) -> Result<QueryResponse, KiraError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some((_, status)) = self
            .failures
            .iter()
            .find(|(scope, _)| *scope == request.scopes)
        {
            return Err(KiraError::ProviderStatus {
                status: *status,
                message: "mock failure".to_string(),
            });
        }

        let scopes: Vec<&str> = request.scopes.split(',').collect();
        let fields: Vec<&str> = request.fields.split(',').collect();
        let mut hits = Vec::new();
        for term in request.terms.as_slice() {
            let matched: Vec<&MockGene> = self
                .genes
                .iter()
                .filter(|gene| Self::in_species(&request.species, gene.taxid))
                .filter(|gene| scopes.iter().any(|scope| gene.matches(scope, term)))
                .collect();
            if matched.is_empty() {
                hits.push(json!({"query": term, "notfound": true}));
            }
            for gene in matched {
                hits.push(gene.hit(term, &fields));
            }
        }
        Ok(QueryResponse::from_hits(parse_hits(Value::Array(hits))?))
    }
}

pub fn catalog() -> Vec<MockGene> {
    let insulin = json!({"id": 173, "genes": [[9606, 3630], [10090, 16334], [10116, 24506]]});
    let atp1a2 = json!({"id": 20060, "genes": [[10090, 98660], [9606, 477]]});
    let alpk3 = json!({"id": 12995, "genes": [[10090, 116904], [9606, 57538]]});
    let gpr = json!({"id": 45678, "genes": [[9544, 711495], [9913, 780240], [9606, 148252]]});
    vec![
        MockGene {
            id: "25",
            taxid: 9606,
            symbol: "ABL1",
            name: "ABL proto-oncogene 1, non-receptor tyrosine kinase",
            ensembl: &["ENSG00000097007"],
            uniprot: &["P00519"],
            homologene: None,
        },
        MockGene {
            id: "3717",
            taxid: 9606,
            symbol: "JAK2",
            name: "Janus kinase 2",
            ensembl: &["ENSG00000096968"],
            uniprot: &["O60674"],
            homologene: None,
        },
        MockGene {
            id: "11127",
            taxid: 9606,
            symbol: "KIF3A",
            name: "kinesin family member 3A",
            ensembl: &["ENSG00000131437"],
            uniprot: &["Q9Y496"],
            homologene: None,
        },
        MockGene {
            id: "3799",
            taxid: 9606,
            symbol: "KIF5B",
            name: "kinesin family member 5B",
            ensembl: &["ENSG00000170759"],
            uniprot: &["P33176"],
            homologene: None,
        },
        MockGene {
            id: "3630",
            taxid: 9606,
            symbol: "INS",
            name: "insulin",
            ensembl: &["ENSG00000254647"],
            uniprot: &["P01308"],
            homologene: Some(insulin.clone()),
        },
        MockGene {
            id: "16334",
            taxid: 10090,
            symbol: "Ins2",
            name: "insulin II",
            ensembl: &["ENSMUSG00000000215"],
            uniprot: &["P01326"],
            homologene: Some(insulin),
        },
        MockGene {
            id: "477",
            taxid: 9606,
            symbol: "ATP1A2",
            name: "ATPase Na+/K+ transporting subunit alpha 2",
            ensembl: &["ENSG00000018625"],
            uniprot: &["P50993"],
            homologene: Some(atp1a2.clone()),
        },
        MockGene {
            id: "98660",
            taxid: 10090,
            symbol: "Atp1a2",
            name: "ATPase, Na+/K+ transporting, alpha 2 polypeptide",
            ensembl: &["ENSMUSG00000007097"],
            uniprot: &["Q6PIE5"],
            homologene: Some(atp1a2),
        },
        MockGene {
            id: "57538",
            taxid: 9606,
            symbol: "ALPK3",
            name: "alpha kinase 3",
            ensembl: &["ENSG00000136383"],
            uniprot: &["Q96L96"],
            homologene: Some(alpk3.clone()),
        },
        MockGene {
            id: "116904",
            taxid: 10090,
            symbol: "Alpk3",
            name: "alpha-kinase 3",
            ensembl: &["ENSMUSG00000038763"],
            uniprot: &["Q3UHC3"],
            homologene: Some(alpk3),
        },
        MockGene {
            id: "148252",
            taxid: 9606,
            symbol: "DIRAS1",
            name: "DIRAS family GTPase 1",
            ensembl: &["ENSG00000176490"],
            uniprot: &["O95057"],
            homologene: Some(gpr.clone()),
        },
        MockGene {
            id: "711495",
            taxid: 9544,
            symbol: "DIRAS1",
            name: "DIRAS family GTPase 1",
            ensembl: &[],
            uniprot: &[],
            homologene: Some(gpr.clone()),
        },
        MockGene {
            id: "780240",
            taxid: 9913,
            symbol: "DIRAS1",
            name: "DIRAS family GTPase 1",
            ensembl: &[],
            uniprot: &[],
            homologene: Some(gpr),
        },
        MockGene {
            id: "691975",
            taxid: 7955,
            symbol: "si:ch211-1a19.3",
            name: "si:ch211-1a19.3",
            ensembl: &[],
            uniprot: &[],
            homologene: Some(json!({"id": 1, "genes": [7955, 691975]})),
        },
    ]
}
