use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::time::Duration;

use crate::retriever::{RetrievalQuery, Retriever, ranked};
use crate::{Passage, vector};

/// Astra DB Data API collection searched by `$vector` sort.
///
/// The query vector is sent in binary form (little-endian f32, base64) and
/// only the text field is projected back.
pub struct AstraRetriever {
    api_endpoint: String,
    keyspace: String,
    collection: String,
    token: String,
    text_field: String,
    client: reqwest::blocking::Client,
}

#[derive(Deserialize)]
struct FindResponse {
    #[serde(default)]
    data: Option<FindData>,
    #[serde(default)]
    errors: Vec<DataApiError>,
}

#[derive(Deserialize)]
struct FindData {
    #[serde(default)]
    documents: Vec<Map<String, Value>>,
}

#[derive(Deserialize)]
struct DataApiError {
    #[serde(default)]
    message: String,
}

impl AstraRetriever {
    pub fn new(
        api_endpoint: String,
        keyspace: String,
        collection: String,
        token: String,
        text_field: String,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build Astra HTTP client")?;

        Ok(Self {
            api_endpoint,
            keyspace,
            collection,
            token,
            text_field,
            client,
        })
    }

    fn find_command(&self, query: &RetrievalQuery<'_>) -> Value {
        let filter = match query.namespace.filter(|ns| !ns.is_empty()) {
            Some(ns) => json!({ "namespace": ns }),
            None => json!({}),
        };

        let mut projection = Map::new();
        projection.insert(self.text_field.clone(), json!(1));

        json!({
            "find": {
                "filter": filter,
                "sort": { "$vector": vector::to_binary_json(query.vector) },
                "projection": projection,
                "options": { "limit": query.top_k }
            }
        })
    }
}

impl Retriever for AstraRetriever {
    fn retrieve(&self, query: &RetrievalQuery<'_>) -> Result<Vec<Passage>> {
        let url = format!(
            "{}/api/json/v1/{}/{}",
            self.api_endpoint.trim_end_matches('/'),
            self.keyspace,
            self.collection
        );

        let response = self
            .client
            .post(&url)
            .header("Token", &self.token)
            .json(&self.find_command(query))
            .send()
            .context("Failed to send find command to Astra")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().unwrap_or_else(|_| "Unknown error".to_string());
            anyhow::bail!("Astra find failed: {} {}", status, error_text);
        }

        let result: FindResponse = response
            .json()
            .context("Failed to parse Astra response")?;

        // The Data API reports command errors with a 200 status.
        if let Some(first) = result.errors.first() {
            anyhow::bail!("Astra find failed: {}", first.message);
        }

        let documents = result.data.map(|d| d.documents).unwrap_or_default();
        let texts = documents.into_iter().filter_map(|doc| {
            let text = doc
                .get(&self.text_field)
                .and_then(|v| v.as_str())
                .map(str::to_string);
            if text.is_none() {
                tracing::debug!(field = %self.text_field, "Skipping document without text");
            }
            let score = doc
                .get("$similarity")
                .and_then(|v| v.as_f64())
                .map(|s| s as f32);
            text.map(|t| (t, score))
        });

        Ok(ranked(texts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn retriever(url: String) -> AstraRetriever {
        AstraRetriever::new(
            url,
            "default_keyspace".to_string(),
            "book_embeddings".to_string(),
            "AstraCS:test".to_string(),
            "text".to_string(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_find_command_encodes_vector_as_binary() {
        let r = retriever("http://localhost".to_string());
        let cmd = r.find_command(&RetrievalQuery {
            vector: &[1.0],
            top_k: 5,
            namespace: None,
        });

        assert_eq!(
            cmd,
            json!({
                "find": {
                    "filter": {},
                    "sort": { "$vector": { "$binary": "AACAPw==" } },
                    "projection": { "text": 1 },
                    "options": { "limit": 5 }
                }
            })
        );
    }

    #[test]
    fn test_find_command_filters_by_namespace() {
        let r = retriever("http://localhost".to_string());
        let cmd = r.find_command(&RetrievalQuery {
            vector: &[1.0],
            top_k: 5,
            namespace: Some("gawdat"),
        });
        assert_eq!(cmd["find"]["filter"], json!({ "namespace": "gawdat" }));
    }

    #[test]
    fn test_retrieve_projects_text_in_order() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/api/json/v1/default_keyspace/book_embeddings")
            .match_header("token", "AstraCS:test")
            .match_body(Matcher::PartialJson(json!({ "find": { "options": { "limit": 5 } } })))
            .with_status(200)
            .with_body(
                json!({
                    "data": {
                        "documents": [
                            {"_id": "1", "text": "first"},
                            {"_id": "2"},
                            {"_id": "3", "text": "third"}
                        ],
                        "nextPageState": null
                    }
                })
                .to_string(),
            )
            .create();

        let passages = retriever(server.url())
            .retrieve(&RetrievalQuery {
                vector: &[0.1, 0.2],
                top_k: 5,
                namespace: None,
            })
            .unwrap();

        mock.assert();
        let texts: Vec<_> = passages.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "third"]);
        assert_eq!(passages[0].score, None);
    }

    #[test]
    fn test_data_api_errors_with_ok_status() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/api/json/v1/default_keyspace/book_embeddings")
            .with_status(200)
            .with_body(r#"{"errors":[{"message":"Collection does not exist","errorCode":"COLLECTION_NOT_EXIST"}]}"#)
            .create();

        let err = retriever(server.url())
            .retrieve(&RetrievalQuery {
                vector: &[0.1],
                top_k: 5,
                namespace: None,
            })
            .unwrap_err();
        assert!(err.to_string().contains("Collection does not exist"));
    }
}
