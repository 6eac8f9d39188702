//! Host schema identifiers.
//!
//! The host owns these tables; Insight only reads them. Every report query
//! names tables, columns and aliases through the enums below so identifiers
//! are quoted the same way in every statement.

use sea_query::Iden;

/// Node object type identifiers stored in `umbracoNode.nodeObjectType`.
pub mod object_types {
    use uuid::{Uuid, uuid};

    /// Document (content) type.
    pub const DOCUMENT_TYPE: Uuid = uuid!("a2cb7800-f571-4787-9638-bc48539a0efb");
    /// Media type.
    pub const MEDIA_TYPE: Uuid = uuid!("4ea4382b-2f5a-4c2b-9587-ae9b3cf3602e");
    /// Member type.
    pub const MEMBER_TYPE: Uuid = uuid!("9b5416fb-e72f-45a9-a07b-5a9a2709ce43");
    /// Member group.
    pub const MEMBER_GROUP: Uuid = uuid!("366e63b9-880f-4e13-a61c-98069b029728");
}

/// Optional feature tables that may not be provisioned.
pub const SERVER_TABLE: &str = "umbracoServer";
pub const KEY_VALUE_TABLE: &str = "umbracoKeyValue";

/// Table aliases used inside report queries.
#[derive(Iden, Clone, Copy)]
pub enum Src {
    #[iden = "N"]
    Node,
    #[iden = "C"]
    Content,
    #[iden = "CT"]
    ContentType,
    #[iden = "D"]
    Document,
    #[iden = "V"]
    Version,
    #[iden = "Creator"]
    Creator,
    #[iden = "Updater"]
    Updater,
    #[iden = "CV"]
    Variation,
    #[iden = "M"]
    Member,
    #[iden = "MN"]
    MemberNode,
    #[iden = "MG"]
    MemberGroup,
    #[iden = "DT"]
    DocumentType,
    #[iden = "T"]
    Template,
}

#[derive(Iden, Clone, Copy)]
pub enum Node {
    #[iden = "umbracoNode"]
    Table,
    #[iden = "id"]
    Id,
    #[iden = "uniqueId"]
    UniqueId,
    #[iden = "parentId"]
    ParentId,
    #[iden = "level"]
    Level,
    #[iden = "trashed"]
    Trashed,
    #[iden = "nodeUser"]
    NodeUser,
    #[iden = "text"]
    Text,
    #[iden = "nodeObjectType"]
    NodeObjectType,
    #[iden = "createDate"]
    CreateDate,
}

#[derive(Iden, Clone, Copy)]
pub enum Content {
    #[iden = "umbracoContent"]
    Table,
    #[iden = "nodeId"]
    NodeId,
    #[iden = "contentTypeId"]
    ContentTypeId,
}

#[derive(Iden, Clone, Copy)]
pub enum ContentType {
    #[iden = "cmsContentType"]
    Table,
    #[iden = "pk"]
    Pk,
    #[iden = "nodeId"]
    NodeId,
    #[iden = "alias"]
    Alias,
    #[iden = "icon"]
    Icon,
    #[iden = "description"]
    Description,
}

#[derive(Iden, Clone, Copy)]
pub enum Document {
    #[iden = "umbracoDocument"]
    Table,
    #[iden = "nodeId"]
    NodeId,
}

#[derive(Iden, Clone, Copy)]
pub enum ContentVersion {
    #[iden = "umbracoContentVersion"]
    Table,
    #[iden = "nodeId"]
    NodeId,
    #[iden = "versionDate"]
    VersionDate,
    #[iden = "userId"]
    UserId,
    #[iden = "current"]
    Current,
}

#[derive(Iden, Clone, Copy)]
pub enum User {
    #[iden = "umbracoUser"]
    Table,
    #[iden = "id"]
    Id,
    #[iden = "userName"]
    UserName,
}

#[derive(Iden, Clone, Copy)]
pub enum CultureVariation {
    #[iden = "umbracoDocumentCultureVariation"]
    Table,
    #[iden = "nodeId"]
    NodeId,
    #[iden = "languageId"]
    LanguageId,
}

#[derive(Iden, Clone, Copy)]
pub enum Language {
    #[iden = "umbracoLanguage"]
    Table,
    #[iden = "id"]
    Id,
    #[iden = "languageCultureName"]
    CultureName,
}

#[derive(Iden, Clone, Copy)]
pub enum DocumentType {
    #[iden = "cmsDocumentType"]
    Table,
    #[iden = "contentTypeNodeId"]
    ContentTypeNodeId,
    #[iden = "templateNodeId"]
    TemplateNodeId,
}

#[derive(Iden, Clone, Copy)]
pub enum Template {
    #[iden = "cmsTemplate"]
    Table,
    #[iden = "nodeId"]
    NodeId,
}

#[derive(Iden, Clone, Copy)]
pub enum Member {
    #[iden = "cmsMember"]
    Table,
    #[iden = "nodeId"]
    NodeId,
    #[iden = "Email"]
    Email,
    #[iden = "LoginName"]
    LoginName,
}

#[derive(Iden, Clone, Copy)]
pub enum MemberToGroup {
    #[iden = "cmsMember2MemberGroup"]
    Table,
    #[iden = "Member"]
    Member,
    #[iden = "MemberGroup"]
    MemberGroup,
}

#[derive(Iden, Clone, Copy)]
pub enum Server {
    #[iden = "umbracoServer"]
    Table,
    #[iden = "id"]
    Id,
    #[iden = "address"]
    Address,
    #[iden = "computerName"]
    ComputerName,
    #[iden = "registeredDate"]
    RegisteredDate,
    #[iden = "lastNotifiedDate"]
    LastNotifiedDate,
    #[iden = "isActive"]
    IsActive,
    #[iden = "isMaster"]
    IsMaster,
}

#[derive(Iden, Clone, Copy)]
pub enum KeyValue {
    #[iden = "umbracoKeyValue"]
    Table,
    #[iden = "key"]
    Key,
    #[iden = "value"]
    Value,
    #[iden = "updated"]
    Updated,
}
