use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::entities::device::{self, DeviceType};
use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct RegisterDevice {
    pub name: String,
    pub device_type: DeviceType,
    pub device_identifier: String,
    pub settings: Option<Value>,
}

/// Shallow-merge `patch` into `current`; a `null` value removes the key.
fn merge_settings(current: &Value, patch: Map<String, Value>) -> Value {
    let mut merged = current.as_object().cloned().unwrap_or_default();
    for (key, value) in patch {
        if value.is_null() {
            merged.remove(&key);
        } else {
            merged.insert(key, value);
        }
    }
    Value::Object(merged)
}

fn settings_object(value: Option<Value>) -> Result<Map<String, Value>, AppError> {
    match value {
        None => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map),
        Some(_) => Err(AppError::BadRequest(
            "Device settings must be a JSON object.".to_string(),
        )),
    }
}

pub struct DeviceService;

impl DeviceService {
    /// Register a device, or re-activate the one already known by its identifier.
    pub async fn register(
        db: &DatabaseConnection,
        user_id: Uuid,
        input: RegisterDevice,
    ) -> Result<(device::Model, bool), AppError> {
        let name = input.name.trim().to_string();
        let identifier = input.device_identifier.trim().to_string();

        let mut errors = Vec::new();
        if name.is_empty() || name.chars().count() > 100 {
            errors.push("Device name must be 1-100 characters.".to_string());
        }
        if identifier.is_empty() || identifier.chars().count() > 255 {
            errors.push("Device identifier must be 1-255 characters.".to_string());
        }
        let settings = match settings_object(input.settings) {
            Ok(map) => map,
            Err(AppError::BadRequest(message)) => {
                errors.push(message);
                Map::new()
            }
            Err(other) => return Err(other),
        };
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let now = Utc::now();
        let existing = device::Entity::find()
            .filter(device::Column::UserId.eq(user_id))
            .filter(device::Column::DeviceIdentifier.eq(&identifier))
            .one(db)
            .await?;

        if let Some(device) = existing {
            let merged = merge_settings(&device.settings, settings);
            let mut active: device::ActiveModel = device.into();
            active.name = Set(name);
            active.device_type = Set(input.device_type);
            active.settings = Set(merged);
            active.is_active = Set(true);
            active.last_active_at = Set(Some(now.into()));
            active.updated_at = Set(now.into());
            let device = active.update(db).await?;

            tracing::info!(user_id = %user_id, device_id = %device.id, "Device re-registered");
            return Ok((device, false));
        }

        let device = device::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            name: Set(name),
            device_type: Set(input.device_type),
            device_identifier: Set(identifier),
            settings: Set(Value::Object(settings)),
            is_active: Set(true),
            last_active_at: Set(Some(now.into())),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(db)
        .await?;

        tracing::info!(user_id = %user_id, device_id = %device.id, "Device registered");
        Ok((device, true))
    }

    pub async fn list(
        db: &DatabaseConnection,
        user_id: Uuid,
    ) -> Result<Vec<device::Model>, AppError> {
        Ok(device::Entity::find()
            .filter(device::Column::UserId.eq(user_id))
            .order_by_desc(device::Column::UpdatedAt)
            .all(db)
            .await?)
    }

    /// A device owned by the user; anyone else's is reported missing.
    pub async fn get(
        db: &DatabaseConnection,
        user_id: Uuid,
        device_id: Uuid,
    ) -> Result<device::Model, AppError> {
        device::Entity::find_by_id(device_id)
            .filter(device::Column::UserId.eq(user_id))
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Device not found.".to_string()))
    }

    pub async fn update_settings(
        db: &DatabaseConnection,
        user_id: Uuid,
        device_id: Uuid,
        patch: Value,
    ) -> Result<device::Model, AppError> {
        let patch = settings_object(Some(patch))?;
        let device = Self::get(db, user_id, device_id).await?;
        let merged = merge_settings(&device.settings, patch);

        let now = Utc::now();
        let mut active: device::ActiveModel = device.into();
        active.settings = Set(merged);
        active.last_active_at = Set(Some(now.into()));
        active.updated_at = Set(now.into());
        Ok(active.update(db).await?)
    }

    pub async fn delete(
        db: &DatabaseConnection,
        user_id: Uuid,
        device_id: Uuid,
    ) -> Result<(), AppError> {
        let device = Self::get(db, user_id, device_id).await?;
        device.delete(db).await?;

        tracing::info!(user_id = %user_id, device_id = %device_id, "Device removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merge_overwrites_and_removes_keys() {
        let current = json!({"theme": "dark", "notifications": true, "lang": "en"});
        let patch = json!({"theme": "light", "lang": null, "volume": 3});
        let merged = merge_settings(&current, patch.as_object().cloned().unwrap_or_default());

        assert_eq!(merged, json!({"theme": "light", "notifications": true, "volume": 3}));
    }

    #[test]
    fn non_object_settings_are_rejected() {
        assert!(settings_object(Some(json!([1, 2]))).is_err());
        assert!(settings_object(Some(json!("dark"))).is_err());
        assert!(settings_object(None).is_ok_and(|m| m.is_empty()));
    }
}
