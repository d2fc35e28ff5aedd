//! Container packing message handler

use anyhow::{bail, Context, Result};
use async_nats::{Client, Subscriber};
use futures::StreamExt;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::services::packing::{self, MAX_PACK_UNITS};
use crate::types::{
    ContainerDims, ErrorResponse, PackRequest, PackResponse, Request, SuccessResponse,
};

/// Handle loadplan.pack messages
pub async fn handle_pack(client: Client, mut subscriber: Subscriber) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received pack message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        // Parse request
        let request: Request<PackRequest> = match serde_json::from_slice(&msg.payload) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse request: {}", e);
                let error = ErrorResponse::new(Uuid::nil(), "INVALID_REQUEST", e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
                continue;
            }
        };

        match pack_request(request.payload).await {
            Ok(response) => {
                debug!(
                    "Packed {} units, {} unplaced, {} truncated",
                    response.placed.len(),
                    response.unplaced.len(),
                    response.truncated
                );
                let success = SuccessResponse::new(request.id, response);
                let _ = client.publish(reply, serde_json::to_vec(&success)?.into()).await;
            }
            Err(e) => {
                warn!("Rejected pack request {}: {}", request.id, e);
                let error = ErrorResponse::new(request.id, "INVALID_REQUEST", e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
            }
        }
    }

    Ok(())
}

/// Validate, then lay out on the blocking pool
async fn pack_request(request: PackRequest) -> Result<PackResponse> {
    validate_request(&request)?;

    let result = tokio::task::spawn_blocking(move || {
        packing::pack(&request.lines, &request.container, request.variant)
    })
    .await
    .context("Packing task failed")?;

    Ok(result.into())
}

fn validate_request(request: &PackRequest) -> Result<()> {
    validate_container(&request.container)?;

    let units = packing::unit_count(&request.lines, request.variant);
    if units > MAX_PACK_UNITS {
        bail!("request expands to {} units, at most {} are allowed", units, MAX_PACK_UNITS);
    }
    Ok(())
}

fn validate_container(container: &ContainerDims) -> Result<()> {
    let dims = [container.width, container.height, container.depth];
    if dims.iter().any(|d| !d.is_finite() || *d <= 0.0) {
        bail!(
            "container dimensions must be positive, got {}x{}x{}",
            container.width,
            container.height,
            container.depth
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PackLine, PackingVariant};

    fn line(order: &str, quantity: u32) -> PackLine {
        PackLine {
            order_id: order.to_string(),
            item_name: "Air_Fryer_Pro".to_string(),
            width: 35.0,
            height: 30.0,
            depth: 40.0,
            quantity,
            color: "#e74c3c".to_string(),
        }
    }

    #[tokio::test]
    async fn test_pack_request_default_container() {
        let json = r#"{"lines": [{
            "orderId": "ORD-1", "itemName": "Air_Fryer_Pro",
            "width": 35, "height": 30, "depth": 40, "quantity": 2, "color": "red"
        }]}"#;
        let request: PackRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.container, ContainerDims::default());
        assert_eq!(request.variant, PackingVariant::Shelf);

        let response = pack_request(request).await.unwrap();
        assert_eq!(response.placed.len(), 2);
        assert!(response.unplaced.is_empty());
    }

    #[tokio::test]
    async fn test_pack_request_corner_point() {
        let request = PackRequest {
            lines: vec![line("ORD-1", 4), line("ORD-2", 3)],
            container: ContainerDims::new(100.0, 100.0, 100.0),
            variant: PackingVariant::CornerPoint,
        };

        let response = pack_request(request).await.unwrap();
        assert_eq!(response.placed.len() + response.unplaced.len(), 7);
        assert_eq!(response.truncated, 0);
    }

    #[test]
    fn test_pack_request_rejects_bad_container() {
        let request = PackRequest {
            lines: vec![line("ORD-1", 1)],
            container: ContainerDims::new(0.0, 100.0, 100.0),
            variant: PackingVariant::Shelf,
        };
        assert!(validate_request(&request).is_err());

        let request = PackRequest {
            container: ContainerDims::new(100.0, f64::NAN, 100.0),
            ..request
        };
        assert!(validate_request(&request).is_err());
    }

    #[test]
    fn test_oversized_quantity_is_rejected() {
        let request = PackRequest {
            lines: vec![line("ORD-1", 4_000_000_000)],
            container: ContainerDims::default(),
            variant: PackingVariant::CornerPoint,
        };
        let err = validate_request(&request).unwrap_err();
        assert!(err.to_string().contains("at most"));

        let request = PackRequest {
            lines: vec![line("ORD-1", 1_500), line("ORD-2", 1_500)],
            ..request
        };
        assert!(validate_request(&request).is_err());
    }

    #[tokio::test]
    async fn test_shelf_counts_only_displayed_units() {
        // the display cap keeps a huge shelf line to a handful of rendered units
        let request = PackRequest {
            lines: vec![line("ORD-1", 4_000_000_000)],
            container: ContainerDims::default(),
            variant: PackingVariant::Shelf,
        };
        assert!(validate_request(&request).is_ok());

        let response = pack_request(request).await.unwrap();
        assert_eq!(response.placed.len(), 10);
        assert_eq!(response.truncated, 3_999_999_990);
    }

    #[tokio::test]
    async fn test_pack_request_empty_lines() {
        let request = PackRequest {
            lines: Vec::new(),
            container: ContainerDims::default(),
            variant: PackingVariant::CornerPoint,
        };
        let response = pack_request(request).await.unwrap();
        assert!(response.placed.is_empty());
        assert!(response.unplaced.is_empty());
    }
}
