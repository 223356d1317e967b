use crate::apis::common::Tag;
use crate::apis::database::{Endpoint, RdsInstanceObservation, RdsInstanceParameters};
use crate::clients::{classify, AwsError};
use crate::managed::connection::{
    ConnectionDetails, SECRET_ENDPOINT_KEY, SECRET_PORT_KEY, SECRET_USER_KEY,
};
use async_trait::async_trait;
use aws_sdk_rds::types;
use std::collections::BTreeSet;

const NOT_FOUND_CODES: &[&str] = &["DBInstanceNotFound", "DBInstanceNotFoundFault"];

/// The fields of an RDS DB instance this provider reads.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DbInstance {
    pub db_instance_identifier: Option<String>,
    pub db_instance_arn: Option<String>,
    pub db_instance_class: Option<String>,
    pub db_instance_status: Option<String>,
    pub engine: Option<String>,
    pub engine_version: Option<String>,
    pub allocated_storage: Option<i32>,
    pub master_username: Option<String>,
    pub db_name: Option<String>,
    pub multi_az: Option<bool>,
    pub publicly_accessible: Option<bool>,
    pub backup_retention_period: Option<i32>,
    pub storage_type: Option<String>,
    pub preferred_backup_window: Option<String>,
    pub preferred_maintenance_window: Option<String>,
    pub deletion_protection: Option<bool>,
    pub db_subnet_group_name: Option<String>,
    pub vpc_security_group_ids: Vec<String>,
    pub storage_encrypted: Option<bool>,
    pub kms_key_id: Option<String>,
    pub endpoint: Option<Endpoint>,
    pub tags: Vec<Tag>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CreateDbInstanceInput {
    pub db_instance_identifier: String,
    pub master_user_password: String,
    pub db_instance_class: String,
    pub engine: String,
    pub engine_version: Option<String>,
    pub allocated_storage: Option<i32>,
    pub master_username: Option<String>,
    pub db_name: Option<String>,
    pub port: Option<i32>,
    pub multi_az: Option<bool>,
    pub publicly_accessible: Option<bool>,
    pub backup_retention_period: Option<i32>,
    pub storage_type: Option<String>,
    pub preferred_backup_window: Option<String>,
    pub preferred_maintenance_window: Option<String>,
    pub deletion_protection: Option<bool>,
    pub db_subnet_group_name: Option<String>,
    pub vpc_security_group_ids: Vec<String>,
    pub storage_encrypted: Option<bool>,
    pub kms_key_id: Option<String>,
    pub tags: Vec<Tag>,
}

/// Desired values that differ from the live instance. Unset fields are left alone.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RdsInstancePatch {
    pub db_instance_class: Option<String>,
    pub engine_version: Option<String>,
    pub allocated_storage: Option<i32>,
    pub port: Option<i32>,
    pub multi_az: Option<bool>,
    pub publicly_accessible: Option<bool>,
    pub backup_retention_period: Option<i32>,
    pub storage_type: Option<String>,
    pub preferred_backup_window: Option<String>,
    pub preferred_maintenance_window: Option<String>,
    pub deletion_protection: Option<bool>,
    pub db_subnet_group_name: Option<String>,
    pub vpc_security_group_ids: Vec<String>,
    pub tags: Vec<Tag>,
}

impl RdsInstancePatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModifyDbInstanceInput {
    pub db_instance_identifier: String,
    pub apply_immediately: Option<bool>,
    pub master_user_password: Option<String>,
    pub db_instance_class: Option<String>,
    pub engine_version: Option<String>,
    pub allocated_storage: Option<i32>,
    pub port: Option<i32>,
    pub multi_az: Option<bool>,
    pub publicly_accessible: Option<bool>,
    pub backup_retention_period: Option<i32>,
    pub storage_type: Option<String>,
    pub preferred_backup_window: Option<String>,
    pub preferred_maintenance_window: Option<String>,
    pub deletion_protection: Option<bool>,
    pub db_subnet_group_name: Option<String>,
    /// Empty leaves the security groups alone.
    pub vpc_security_group_ids: Vec<String>,
}

impl ModifyDbInstanceInput {
    /// Whether the request would change anything.
    pub fn has_changes(&self) -> bool {
        let bare = Self {
            db_instance_identifier: self.db_instance_identifier.clone(),
            apply_immediately: self.apply_immediately,
            ..Self::default()
        };
        *self != bare
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DeleteDbInstanceInput {
    pub db_instance_identifier: String,
    pub skip_final_snapshot: Option<bool>,
    pub final_db_snapshot_identifier: Option<String>,
}

#[async_trait]
pub trait RdsApi: Send + Sync {
    /// Describes one instance by identifier. An empty result is reported as not found.
    async fn describe_db_instance(&self, id: &str) -> Result<DbInstance, AwsError>;

    async fn create_db_instance(&self, input: CreateDbInstanceInput) -> Result<(), AwsError>;

    async fn modify_db_instance(&self, input: ModifyDbInstanceInput) -> Result<(), AwsError>;

    async fn add_tags_to_resource(&self, arn: &str, tags: Vec<Tag>) -> Result<(), AwsError>;

    async fn delete_db_instance(&self, input: DeleteDbInstanceInput) -> Result<(), AwsError>;
}

fn non_empty(ids: Vec<String>) -> Option<Vec<String>> {
    (!ids.is_empty()).then_some(ids)
}

fn sdk_tags(tags: Vec<Tag>) -> Vec<types::Tag> {
    tags.into_iter()
        .map(|t| types::Tag::builder().key(t.key).value(t.value).build())
        .collect()
}

impl From<&types::DbInstance> for DbInstance {
    fn from(i: &types::DbInstance) -> Self {
        Self {
            db_instance_identifier: i.db_instance_identifier().map(String::from),
            db_instance_arn: i.db_instance_arn().map(String::from),
            db_instance_class: i.db_instance_class().map(String::from),
            db_instance_status: i.db_instance_status().map(String::from),
            engine: i.engine().map(String::from),
            engine_version: i.engine_version().map(String::from),
            allocated_storage: i.allocated_storage(),
            master_username: i.master_username().map(String::from),
            db_name: i.db_name().map(String::from),
            multi_az: i.multi_az(),
            publicly_accessible: i.publicly_accessible(),
            backup_retention_period: i.backup_retention_period(),
            storage_type: i.storage_type().map(String::from),
            preferred_backup_window: i.preferred_backup_window().map(String::from),
            preferred_maintenance_window: i.preferred_maintenance_window().map(String::from),
            deletion_protection: i.deletion_protection(),
            db_subnet_group_name: i
                .db_subnet_group()
                .and_then(|g| g.db_subnet_group_name())
                .map(String::from),
            vpc_security_group_ids: i
                .vpc_security_groups()
                .iter()
                .filter_map(|g| g.vpc_security_group_id())
                .map(String::from)
                .collect(),
            storage_encrypted: i.storage_encrypted(),
            kms_key_id: i.kms_key_id().map(String::from),
            endpoint: i.endpoint().map(|e| Endpoint {
                address: e.address().unwrap_or_default().to_string(),
                port: e.port(),
                hosted_zone_id: e.hosted_zone_id().map(String::from),
            }),
            tags: i
                .tag_list()
                .iter()
                .map(|t| Tag::new(t.key().unwrap_or_default(), t.value().unwrap_or_default()))
                .collect(),
        }
    }
}

#[async_trait]
impl RdsApi for aws_sdk_rds::Client {
    async fn describe_db_instance(&self, id: &str) -> Result<DbInstance, AwsError> {
        let output = self
            .describe_db_instances()
            .db_instance_identifier(id)
            .send()
            .await
            .map_err(|e| classify(e, NOT_FOUND_CODES))?;
        // An explicit identifier yields at most one instance.
        output
            .db_instances()
            .first()
            .map(DbInstance::from)
            .ok_or_else(|| AwsError::NotFound(format!("DB instance {} not found", id)))
    }

    async fn create_db_instance(&self, input: CreateDbInstanceInput) -> Result<(), AwsError> {
        self.create_db_instance()
            .db_instance_identifier(input.db_instance_identifier)
            .master_user_password(input.master_user_password)
            .db_instance_class(input.db_instance_class)
            .engine(input.engine)
            .set_engine_version(input.engine_version)
            .set_allocated_storage(input.allocated_storage)
            .set_master_username(input.master_username)
            .set_db_name(input.db_name)
            .set_port(input.port)
            .set_multi_az(input.multi_az)
            .set_publicly_accessible(input.publicly_accessible)
            .set_backup_retention_period(input.backup_retention_period)
            .set_storage_type(input.storage_type)
            .set_preferred_backup_window(input.preferred_backup_window)
            .set_preferred_maintenance_window(input.preferred_maintenance_window)
            .set_deletion_protection(input.deletion_protection)
            .set_db_subnet_group_name(input.db_subnet_group_name)
            .set_vpc_security_group_ids(non_empty(input.vpc_security_group_ids))
            .set_storage_encrypted(input.storage_encrypted)
            .set_kms_key_id(input.kms_key_id)
            .set_tags(Some(sdk_tags(input.tags)))
            .send()
            .await
            .map_err(|e| classify(e, NOT_FOUND_CODES))?;
        Ok(())
    }

    async fn modify_db_instance(&self, input: ModifyDbInstanceInput) -> Result<(), AwsError> {
        self.modify_db_instance()
            .db_instance_identifier(input.db_instance_identifier)
            .set_apply_immediately(input.apply_immediately)
            .set_master_user_password(input.master_user_password)
            .set_db_instance_class(input.db_instance_class)
            .set_engine_version(input.engine_version)
            .set_allocated_storage(input.allocated_storage)
            .set_db_port_number(input.port)
            .set_multi_az(input.multi_az)
            .set_publicly_accessible(input.publicly_accessible)
            .set_backup_retention_period(input.backup_retention_period)
            .set_storage_type(input.storage_type)
            .set_preferred_backup_window(input.preferred_backup_window)
            .set_preferred_maintenance_window(input.preferred_maintenance_window)
            .set_deletion_protection(input.deletion_protection)
            .set_db_subnet_group_name(input.db_subnet_group_name)
            .set_vpc_security_group_ids(non_empty(input.vpc_security_group_ids))
            .send()
            .await
            .map_err(|e| classify(e, NOT_FOUND_CODES))?;
        Ok(())
    }

    async fn add_tags_to_resource(&self, arn: &str, tags: Vec<Tag>) -> Result<(), AwsError> {
        self.add_tags_to_resource()
            .resource_name(arn)
            .set_tags(Some(sdk_tags(tags)))
            .send()
            .await
            .map_err(|e| classify(e, NOT_FOUND_CODES))?;
        Ok(())
    }

    async fn delete_db_instance(&self, input: DeleteDbInstanceInput) -> Result<(), AwsError> {
        self.delete_db_instance()
            .db_instance_identifier(input.db_instance_identifier)
            .set_skip_final_snapshot(input.skip_final_snapshot)
            .set_final_db_snapshot_identifier(input.final_db_snapshot_identifier)
            .send()
            .await
            .map_err(|e| classify(e, NOT_FOUND_CODES))?;
        Ok(())
    }
}

fn late_init<T: Clone>(field: &mut Option<T>, observed: &Option<T>) {
    if field.is_none() {
        *field = observed.clone();
    }
}

/// Fills unset parameters with the values AWS chose for the instance.
pub fn late_initialize(params: &mut RdsInstanceParameters, instance: &DbInstance) {
    late_init(&mut params.engine_version, &instance.engine_version);
    late_init(&mut params.allocated_storage, &instance.allocated_storage);
    late_init(&mut params.master_username, &instance.master_username);
    late_init(&mut params.db_name, &instance.db_name);
    late_init(
        &mut params.port,
        &instance.endpoint.as_ref().and_then(|e| e.port),
    );
    late_init(&mut params.multi_az, &instance.multi_az);
    late_init(&mut params.publicly_accessible, &instance.publicly_accessible);
    late_init(&mut params.backup_retention_period, &instance.backup_retention_period);
    late_init(&mut params.storage_type, &instance.storage_type);
    late_init(&mut params.preferred_backup_window, &instance.preferred_backup_window);
    late_init(
        &mut params.preferred_maintenance_window,
        &instance.preferred_maintenance_window,
    );
    late_init(&mut params.deletion_protection, &instance.deletion_protection);
    late_init(&mut params.db_subnet_group_name, &instance.db_subnet_group_name);
    late_init(&mut params.storage_encrypted, &instance.storage_encrypted);
    late_init(&mut params.kms_key_id, &instance.kms_key_id);
    if params.vpc_security_group_ids.is_empty() {
        params.vpc_security_group_ids = instance.vpc_security_group_ids.clone();
    }
}

pub fn generate_observation(instance: &DbInstance) -> RdsInstanceObservation {
    RdsInstanceObservation {
        db_instance_status: instance.db_instance_status.clone().unwrap_or_default(),
        db_instance_arn: instance.db_instance_arn.clone().unwrap_or_default(),
        engine_version: instance.engine_version.clone(),
        endpoint: instance.endpoint.clone(),
    }
}

fn diff<T: Clone + PartialEq>(desired: &Option<T>, current: &Option<T>) -> Option<T> {
    match desired {
        Some(d) if Some(d) != current.as_ref() => Some(d.clone()),
        _ => None,
    }
}

/// Builds the set of changes needed to bring `current` to `desired`.
pub fn create_patch(current: &DbInstance, desired: &RdsInstanceParameters) -> RdsInstancePatch {
    let class = (Some(desired.db_instance_class.as_str()) != current.db_instance_class.as_deref())
        .then(|| desired.db_instance_class.clone());

    // AWS reports the full version, so "13" is satisfied by "13.4".
    let engine_version = match (&desired.engine_version, &current.engine_version) {
        (Some(d), Some(c)) if c == d || c.starts_with(&format!("{}.", d)) => None,
        (d, _) => d.clone(),
    };

    // Security groups compare as sets; an empty list leaves them unmanaged.
    let vpc_security_group_ids = {
        let as_set = |ids: &[String]| ids.iter().cloned().collect::<BTreeSet<_>>();
        if desired.vpc_security_group_ids.is_empty()
            || as_set(&desired.vpc_security_group_ids) == as_set(&current.vpc_security_group_ids)
        {
            Vec::new()
        } else {
            desired.vpc_security_group_ids.clone()
        }
    };

    let tags = desired
        .tags
        .iter()
        .filter(|t| !current.tags.contains(t))
        .cloned()
        .collect();

    RdsInstancePatch {
        db_instance_class: class,
        engine_version,
        allocated_storage: diff(&desired.allocated_storage, &current.allocated_storage),
        port: diff(&desired.port, &current.endpoint.as_ref().and_then(|e| e.port)),
        multi_az: diff(&desired.multi_az, &current.multi_az),
        publicly_accessible: diff(&desired.publicly_accessible, &current.publicly_accessible),
        backup_retention_period: diff(
            &desired.backup_retention_period,
            &current.backup_retention_period,
        ),
        storage_type: diff(&desired.storage_type, &current.storage_type),
        preferred_backup_window: diff(
            &desired.preferred_backup_window,
            &current.preferred_backup_window,
        ),
        preferred_maintenance_window: diff(
            &desired.preferred_maintenance_window,
            &current.preferred_maintenance_window,
        ),
        deletion_protection: diff(&desired.deletion_protection, &current.deletion_protection),
        db_subnet_group_name: diff(&desired.db_subnet_group_name, &current.db_subnet_group_name),
        vpc_security_group_ids,
        tags,
    }
}

pub fn is_up_to_date(desired: &RdsInstanceParameters, current: &DbInstance) -> bool {
    create_patch(current, desired).is_empty()
}

pub fn generate_create_input(
    name: &str,
    password: &str,
    params: &RdsInstanceParameters,
) -> CreateDbInstanceInput {
    CreateDbInstanceInput {
        db_instance_identifier: name.to_string(),
        master_user_password: password.to_string(),
        db_instance_class: params.db_instance_class.clone(),
        engine: params.engine.clone(),
        engine_version: params.engine_version.clone(),
        allocated_storage: params.allocated_storage,
        master_username: params.master_username.clone(),
        db_name: params.db_name.clone(),
        port: params.port,
        multi_az: params.multi_az,
        publicly_accessible: params.publicly_accessible,
        backup_retention_period: params.backup_retention_period,
        storage_type: params.storage_type.clone(),
        preferred_backup_window: params.preferred_backup_window.clone(),
        preferred_maintenance_window: params.preferred_maintenance_window.clone(),
        deletion_protection: params.deletion_protection,
        db_subnet_group_name: params.db_subnet_group_name.clone(),
        vpc_security_group_ids: params.vpc_security_group_ids.clone(),
        storage_encrypted: params.storage_encrypted,
        kms_key_id: params.kms_key_id.clone(),
        tags: params.tags.clone(),
    }
}

pub fn generate_modify_input(
    name: &str,
    patch: &RdsInstancePatch,
    apply_immediately: Option<bool>,
) -> ModifyDbInstanceInput {
    ModifyDbInstanceInput {
        db_instance_identifier: name.to_string(),
        apply_immediately,
        master_user_password: None,
        db_instance_class: patch.db_instance_class.clone(),
        engine_version: patch.engine_version.clone(),
        allocated_storage: patch.allocated_storage,
        port: patch.port,
        multi_az: patch.multi_az,
        publicly_accessible: patch.publicly_accessible,
        backup_retention_period: patch.backup_retention_period,
        storage_type: patch.storage_type.clone(),
        preferred_backup_window: patch.preferred_backup_window.clone(),
        preferred_maintenance_window: patch.preferred_maintenance_window.clone(),
        deletion_protection: patch.deletion_protection,
        db_subnet_group_name: patch.db_subnet_group_name.clone(),
        vpc_security_group_ids: patch.vpc_security_group_ids.clone(),
    }
}

/// Endpoint, port and username of an instance, once AWS reports an endpoint.
pub fn connection_details(
    params: &RdsInstanceParameters,
    observation: &RdsInstanceObservation,
) -> ConnectionDetails {
    let mut details = ConnectionDetails::new();
    if let Some(endpoint) = observation.endpoint.as_ref().filter(|e| !e.address.is_empty()) {
        details.insert(SECRET_ENDPOINT_KEY.to_string(), endpoint.address.clone().into_bytes());
        if let Some(port) = endpoint.port {
            details.insert(SECRET_PORT_KEY.to_string(), port.to_string().into_bytes());
        }
    }
    if let Some(user) = &params.master_username {
        details.insert(SECRET_USER_KEY.to_string(), user.clone().into_bytes());
    }
    details
}
