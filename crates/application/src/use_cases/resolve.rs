use crate::ports::DnsExecutor;
use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::Arc;
use tern_domain::{DnsQuery, DomainError, Message, RecordData, RecordType, ResponseCode};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Turns names into usable record values through an executor chain.
///
/// The resolver itself never retries; resilience belongs to the chain.
pub struct Resolver {
    executor: Arc<dyn DnsExecutor>,
}

impl Resolver {
    pub fn new(executor: Arc<dyn DnsExecutor>) -> Self {
        Self { executor }
    }

    /// Resolves `name` to one IPv4 address, picked at random when the
    /// answer holds several.
    pub async fn resolve(&self, name: &str) -> Result<IpAddr, DomainError> {
        let query = DnsQuery::new(name, RecordType::A);
        let values = self.lookup(&query).await?;
        pick_address(&values)
    }

    /// Resolves every record of `record_type` for `name`, following CNAME
    /// chains inside the answer section.
    pub async fn resolve_all(
        &self,
        name: &str,
        record_type: RecordType,
    ) -> Result<Vec<RecordData>, DomainError> {
        let query = DnsQuery::new(name, record_type);
        self.lookup(&query).await
    }

    pub async fn resolve_with_cancel(
        &self,
        name: &str,
        token: &CancellationToken,
    ) -> Result<IpAddr, DomainError> {
        let query = DnsQuery::new(name, RecordType::A);
        let values = self.lookup_with_cancel(&query, token).await?;
        pick_address(&values)
    }

    pub async fn resolve_all_with_cancel(
        &self,
        name: &str,
        record_type: RecordType,
        token: &CancellationToken,
    ) -> Result<Vec<RecordData>, DomainError> {
        let query = DnsQuery::new(name, record_type);
        self.lookup_with_cancel(&query, token).await
    }

    async fn lookup(&self, query: &DnsQuery) -> Result<Vec<RecordData>, DomainError> {
        let response = self.executor.query(query).await?;
        extract_answers(query, &response)
    }

    async fn lookup_with_cancel(
        &self,
        query: &DnsQuery,
        token: &CancellationToken,
    ) -> Result<Vec<RecordData>, DomainError> {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!(query = %query, "Resolution cancelled");
                Err(DomainError::Cancelled { query: query.to_string() })
            }
            result = self.lookup(query) => result,
        }
    }
}

fn pick_address(values: &[RecordData]) -> Result<IpAddr, DomainError> {
    let addresses: Vec<IpAddr> = values.iter().filter_map(RecordData::as_ip).collect();
    match addresses.len() {
        0 => Err(DomainError::InvalidResponse {
            server: "resolver".to_string(),
            reason: "A answer without an address".to_string(),
        }),
        len => Ok(addresses[fastrand::usize(..len)]),
    }
}

/// Extracts the values answering `query` from `response`.
///
/// Fails with `RecordNotFound` when the response code is not NOERROR, or
/// when no record of the queried type is reachable from the query name.
pub fn extract_answers(query: &DnsQuery, response: &Message) -> Result<Vec<RecordData>, DomainError> {
    let rcode = response.rcode();
    if !rcode.is_ok() {
        return Err(DomainError::RecordNotFound {
            message: format!(
                "DNS query for {} returned an error response ({})",
                query, rcode
            ),
            rcode,
        });
    }

    let mut visited = HashSet::new();
    let values = values_by_name_and_type(response, &query.name, query.record_type, &mut visited);

    if values.is_empty() {
        return Err(DomainError::RecordNotFound {
            message: format!(
                "DNS query for {} did not return a valid answer (NOERROR / NODATA)",
                query
            ),
            rcode: ResponseCode::NoError,
        });
    }

    Ok(values)
}

fn values_by_name_and_type(
    response: &Message,
    name: &str,
    record_type: RecordType,
    visited: &mut HashSet<String>,
) -> Vec<RecordData> {
    if !visited.insert(name.to_ascii_lowercase()) {
        return Vec::new();
    }

    let direct: Vec<RecordData> = response
        .answers
        .iter()
        .filter(|r| r.record_type == record_type && r.matches_name(name))
        .map(|r| r.data.clone())
        .collect();
    if !direct.is_empty() {
        return direct;
    }

    let aliases: Vec<&str> = response
        .answers
        .iter()
        .filter(|r| r.record_type == RecordType::CNAME && r.matches_name(name))
        .filter_map(|r| r.data.as_name())
        .collect();

    let mut values = Vec::new();
    for target in aliases {
        values.extend(values_by_name_and_type(response, target, record_type, visited));
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use tern_domain::Record;

    fn response(query: &DnsQuery, answers: Vec<Record>) -> Message {
        Message::response_for(query.clone(), answers)
    }

    #[test]
    fn test_direct_answers_match_name_case_insensitively() {
        let query = DnsQuery::new("Example.COM", RecordType::A);
        let message = response(
            &query,
            vec![
                Record::in_class("example.com", 60, RecordData::A("1.1.1.1".parse().unwrap())),
                Record::in_class("other.com", 60, RecordData::A("2.2.2.2".parse().unwrap())),
            ],
        );

        let values = extract_answers(&query, &message).unwrap();
        assert_eq!(values, vec![RecordData::A("1.1.1.1".parse().unwrap())]);
    }

    #[test]
    fn test_cname_loop_terminates() {
        let query = DnsQuery::new("a.com", RecordType::A);
        let message = response(
            &query,
            vec![
                Record::in_class("a.com", 60, RecordData::Cname("b.com".into())),
                Record::in_class("b.com", 60, RecordData::Cname("a.com".into())),
            ],
        );

        let err = extract_answers(&query, &message).unwrap_err();
        assert_eq!(err.rcode(), Some(ResponseCode::NoError));
    }

    #[test]
    fn test_cname_query_returns_alias_itself() {
        let query = DnsQuery::new("www.example.com", RecordType::CNAME);
        let message = response(
            &query,
            vec![
                Record::in_class("www.example.com", 60, RecordData::Cname("example.com".into())),
                Record::in_class("example.com", 60, RecordData::A("1.2.3.4".parse().unwrap())),
            ],
        );

        let values = extract_answers(&query, &message).unwrap();
        assert_eq!(values, vec![RecordData::Cname("example.com".into())]);
    }

    #[test]
    fn test_pick_address_from_candidates() {
        let values = vec![
            RecordData::A("10.0.0.1".parse().unwrap()),
            RecordData::A("10.0.0.2".parse().unwrap()),
        ];
        for _ in 0..20 {
            let ip = pick_address(&values).unwrap();
            assert!(ip == "10.0.0.1".parse::<IpAddr>().unwrap() || ip == "10.0.0.2".parse::<IpAddr>().unwrap());
        }
    }
}
